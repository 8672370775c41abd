//! Table store: reads and replaces the remote table artifact.
//!
//! `ObjectStore` is whole-object get/put against one fixed location.
//! `TableStore` layers the table encoding on top and owns the recovery
//! policy: a failed read means "no history yet", a failed write is an error.

pub mod local;
pub mod memory;
pub mod s3;
pub mod sigv4;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::{Credentials, S3Location, S3Store};

use crate::table::{CodecError, HistoricalTable, TableFormat};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("access denied for {location} (HTTP {status}); check AWS credentials")]
    Auth { location: String, status: u16 },

    #[error("missing credentials: AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set")]
    MissingCredentials,

    #[error("invalid storage endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("HTTP {status} from {location}: {message}")]
    Http {
        status: u16,
        location: String,
        message: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Whole-object access to one fixed location.
pub trait ObjectStore: Send + Sync {
    /// Human-readable location, e.g. `s3://bucket/key`.
    fn location(&self) -> String;

    /// Fetch the whole object.
    fn get(&self) -> Result<Vec<u8>, StoreError>;

    /// Replace the whole object.
    fn put(&self, bytes: &[u8], content_type: &str) -> Result<(), StoreError>;
}

/// What was written by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub location: String,
    pub rows: usize,
    pub bytes: usize,
    /// blake3 of the encoded artifact.
    pub digest: String,
}

/// Table-level client over an object store.
pub struct TableStore {
    backend: Box<dyn ObjectStore>,
    format: TableFormat,
}

impl TableStore {
    pub fn new(backend: Box<dyn ObjectStore>, format: TableFormat) -> Self {
        Self { backend, format }
    }

    pub fn location(&self) -> String {
        self.backend.location()
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    /// Fetch and decode the artifact, surfacing any failure.
    pub fn try_download(&self) -> Result<HistoricalTable, StoreError> {
        let bytes = self.backend.get()?;
        Ok(self.format.decode(&bytes)?)
    }

    /// Fetch and decode the artifact; any failure reads as "no prior history".
    pub fn download(&self) -> Option<HistoricalTable> {
        match self.try_download() {
            Ok(table) => {
                info!(
                    "loaded {} rows x {} columns from {}",
                    table.len(),
                    table.columns().len(),
                    self.location()
                );
                Some(table)
            }
            Err(e) => {
                warn!("failed to read history from {}: {e}", self.location());
                None
            }
        }
    }

    /// Encode `table` and overwrite the artifact. Last writer wins.
    pub fn upload(&self, table: &HistoricalTable) -> Result<UploadReceipt, StoreError> {
        let bytes = self.format.encode(table)?;
        self.backend.put(&bytes, self.format.content_type())?;

        let receipt = UploadReceipt {
            location: self.location(),
            rows: table.len(),
            bytes: bytes.len(),
            digest: blake3::hash(&bytes).to_hex().to_string(),
        };
        info!(
            "wrote {} rows ({} bytes) to {}",
            receipt.rows, receipt.bytes, receipt.location
        );
        Ok(receipt)
    }
}
