//! Schema enums for network activity
//!
//! `Activity` and `Network` are used as map keys on the wire and in the
//! bucket store, so their serialized names must stay stable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Kind of directory activity that is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    /// Directory lookup of a single member
    Lookup,
    /// Directory search
    Search,
    /// Member registration
    Register,
}

impl Activity {
    /// All activity kinds, in wire order
    pub const ALL: [Activity; 3] = [Self::Lookup, Self::Search, Self::Register];

    /// Get the string name of this activity
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Search => "search",
            Self::Register => "register",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network the activity was observed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// TRISA test network
    TestNet,
    /// TRISA production network
    MainNet,
    /// Robot VASP demo network
    Rvasp,
}

impl Network {
    /// Get the string name of this network
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TestNet => "testnet",
            Self::MainNet => "mainnet",
            Self::Rvasp => "rvasp",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Self::TestNet),
            "mainnet" => Ok(Self::MainNet),
            "rvasp" => Ok(Self::Rvasp),
            _ => Err(ProtocolError::unknown_network(s)),
        }
    }
}
