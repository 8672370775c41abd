//! Symbol registry: the fixed list of instruments captured on every run.
//!
//! Each entry maps a human-readable display name (which becomes a table column)
//! to a vendor ticker. Entry order is the fetch order and the column order of a
//! fresh table.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Conceptual grouping of tracked instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetGroup {
    Yields,
    Commodities,
    Indices,
    Volatility,
    #[default]
    Other,
}

impl AssetGroup {
    /// Display order for grouped listings.
    pub const ALL: [AssetGroup; 5] = [
        AssetGroup::Yields,
        AssetGroup::Commodities,
        AssetGroup::Indices,
        AssetGroup::Volatility,
        AssetGroup::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AssetGroup::Yields => "Yields",
            AssetGroup::Commodities => "Commodities",
            AssetGroup::Indices => "Indices",
            AssetGroup::Volatility => "Volatility",
            AssetGroup::Other => "Other",
        }
    }
}

/// One display name → ticker mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub group: AssetGroup,
}

impl RegistryEntry {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, group: AssetGroup) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            group,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry has no entries")]
    Empty,

    #[error("duplicate display name '{0}'")]
    DuplicateName(String),

    #[error("entry #{0} has a blank display name")]
    BlankName(usize),

    #[error("'{name}' has a blank symbol")]
    BlankSymbol { name: String },
}

/// Validated, read-only registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    /// Build a registry, rejecting blank fields and duplicate display names.
    pub fn from_entries(entries: Vec<RegistryEntry>) -> Result<Self, RegistryError> {
        if entries.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(RegistryError::BlankName(i));
            }
            if entry.symbol.trim().is_empty() {
                return Err(RegistryError::BlankSymbol {
                    name: entry.name.clone(),
                });
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(RegistryError::DuplicateName(entry.name.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// The built-in macro dashboard: treasury yields, futures, global indices, VIX.
    pub fn default_macro() -> Self {
        use AssetGroup::*;

        let table: [(&str, &str, AssetGroup); 20] = [
            ("US 3M Yield", "^IRX", Yields),
            ("US 5Y Yield", "^FVX", Yields),
            ("US 10Y Yield", "^TNX", Yields),
            ("US 30Y Yield", "^TYX", Yields),
            ("Gold", "GC=F", Commodities),
            ("Silver", "SI=F", Commodities),
            ("Copper", "HG=F", Commodities),
            ("Crude Oil", "CL=F", Commodities),
            ("Natural Gas", "NG=F", Commodities),
            ("Corn", "ZC=F", Commodities),
            ("Wheat", "ZW=F", Commodities),
            ("Soybean", "ZS=F", Commodities),
            ("S&P 500", "^GSPC", Indices),
            ("Dow Jones", "^DJI", Indices),
            ("NASDAQ", "^IXIC", Indices),
            ("FTSE 100", "^FTSE", Indices),
            ("DAX", "^GDAXI", Indices),
            ("Nikkei 225", "^N225", Indices),
            ("Shanghai Composite", "000001.SS", Indices),
            ("VIX", "^VIX", Volatility),
        ];

        Self {
            entries: table
                .into_iter()
                .map(|(name, symbol, group)| RegistryEntry::new(name, symbol, group))
                .collect(),
        }
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by display name.
    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Entries belonging to one group, in registry order.
    pub fn group(&self, group: AssetGroup) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter().filter(move |e| e.group == group)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::default_macro()
    }
}
