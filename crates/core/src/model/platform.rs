use std::fmt;
use std::str::FromStr;

use crate::error::IndexError;

/// Target platforms the intermediate build directories are laid out for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    Win64,
}

impl Platform {
    pub const ALL: [Platform; 1] = [Platform::Win64];

    /// Directory name used under `Intermediate/Build`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Platform::Win64 => "Win64",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Platform {
    type Err = IndexError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        match id.to_ascii_lowercase().as_str() {
            "win64" | "windows" => Ok(Platform::Win64),
            _ => Err(IndexError::UnknownPlatform(id.to_string())),
        }
    }
}
