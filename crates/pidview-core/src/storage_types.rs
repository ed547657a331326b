use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Drive backend types
///
/// Selected with `DRIVE_BACKEND`. `Memory` keeps everything in process and is
/// meant for local runs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveBackend {
    #[default]
    Google,
    Memory,
}

impl FromStr for DriveBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" | "gdrive" => Ok(DriveBackend::Google),
            "memory" => Ok(DriveBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid drive backend: {}", s)),
        }
    }
}

impl Display for DriveBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DriveBackend::Google => write!(f, "google"),
            DriveBackend::Memory => write!(f, "memory"),
        }
    }
}
