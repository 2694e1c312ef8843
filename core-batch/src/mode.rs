//! Run modes: upload a directory, or share an already uploaded photoset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BatchError;

/// What a run does with its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Upload missing files and organize the photoset
    Upload,
    /// Make every photo of the photoset visible to family
    ShareWithFamily,
    /// Make every photo of the photoset visible to friends
    ShareWithFriends,
}

impl RunMode {
    /// Visibility flags applied by a sharing mode.
    pub fn sharing_policy(self) -> Option<SharingPolicy> {
        match self {
            RunMode::Upload => None,
            RunMode::ShareWithFamily => Some(SharingPolicy::family()),
            RunMode::ShareWithFriends => Some(SharingPolicy::friends()),
        }
    }
}

impl FromStr for RunMode {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "upload" => Ok(RunMode::Upload),
            "--family" | "family" => Ok(RunMode::ShareWithFamily),
            "--friends" | "friends" => Ok(RunMode::ShareWithFriends),
            other => Err(BatchError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Upload => write!(f, "upload"),
            RunMode::ShareWithFamily => write!(f, "family"),
            RunMode::ShareWithFriends => write!(f, "friends"),
        }
    }
}

/// Family/friends visibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SharingPolicy {
    pub family: bool,
    pub friends: bool,
}

impl SharingPolicy {
    pub fn family() -> Self {
        Self {
            family: true,
            friends: false,
        }
    }

    pub fn friends() -> Self {
        Self {
            family: false,
            friends: true,
        }
    }
}
