//! Netlist format selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Supported netlist formats.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetlistFormat {
    /// Berkeley Logic Interchange Format.
    Blif,
    /// ISCAS89 `.bench` format.
    Iscas89,
}

impl NetlistFormat {
    /// Choose a format from a file extension: `.blif` → BLIF, `.bench` →
    /// ISCAS89, anything else defaults to BLIF.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bench") => NetlistFormat::Iscas89,
            _ => NetlistFormat::Blif,
        }
    }
}

impl FromStr for NetlistFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blif" => Ok(NetlistFormat::Blif),
            "iscas89" | "bench" => Ok(NetlistFormat::Iscas89),
            other => Err(format!("unknown netlist format `{other}`")),
        }
    }
}

impl fmt::Display for NetlistFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetlistFormat::Blif => write!(f, "blif"),
            NetlistFormat::Iscas89 => write!(f, "iscas89"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension_selection() {
        assert_eq!(
            NetlistFormat::from_path(&PathBuf::from("s27.bench")),
            NetlistFormat::Iscas89
        );
        assert_eq!(
            NetlistFormat::from_path(&PathBuf::from("c17.blif")),
            NetlistFormat::Blif
        );
        // Unknown extensions default to BLIF.
        assert_eq!(
            NetlistFormat::from_path(&PathBuf::from("design.net")),
            NetlistFormat::Blif
        );
    }

    #[test]
    fn test_tag_parsing() {
        assert_eq!("blif".parse(), Ok(NetlistFormat::Blif));
        assert_eq!("iscas89".parse(), Ok(NetlistFormat::Iscas89));
        assert!("verilog".parse::<NetlistFormat>().is_err());
    }
}
