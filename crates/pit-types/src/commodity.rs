//! Commodity cards.
//!
//! A commodity is an opaque name handed out by the coordinator. Players
//! never interpret it beyond equality and ordering; the ordering is what
//! makes max/min selection deterministic.

use serde::{Deserialize, Serialize};

/// One tradeable card type, e.g. `"Wheat"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commodity(pub String);

impl Commodity {
    /// Create a commodity from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The commodity name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Commodity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Commodity {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for Commodity {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Commodities of the classic PIT deck, used as the default game setup.
pub const DEFAULT_COMMODITIES: [&str; 5] = ["Barley", "Corn", "Oats", "Rye", "Wheat"];
