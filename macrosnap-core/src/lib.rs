//! macrosnap core: registry, quote fetching, snapshots, historical table, table store.
//!
//! This crate contains every leaf component of a capture run:
//! - Symbol registry (display name → vendor ticker)
//! - Quote providers and the fault-isolating fetch loop
//! - Snapshot builder (timestamped row)
//! - Historical table with CSV/JSON artifact codecs
//! - Object stores (S3, local file, memory) and the table store client

pub mod quotes;
pub mod registry;
pub mod snapshot;
pub mod store;
pub mod table;
pub mod uri;

pub use quotes::{fetch_all, FetchMode, QuoteError, QuoteProvider, QuoteValue, Quotes};
pub use registry::{AssetGroup, Registry, RegistryEntry, RegistryError};
pub use snapshot::{Snapshot, TIMESTAMP_FORMAT};
pub use store::{ObjectStore, StoreError, TableStore, UploadReceipt};
pub use table::{CodecError, HistoricalTable, TableFormat, TableRow};
