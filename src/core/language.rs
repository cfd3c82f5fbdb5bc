//! HDL source languages.
//!
//! The language of a source file is taken from its extension only. Nothing in
//! hdlflow reads HDL text.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Hardware description language of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HdlLanguage {
    /// VHDL (`.vhd`, `.vhdl`), analyzed as VHDL-2008
    Vhdl,
    /// Verilog-2005 (`.v`)
    Verilog,
    /// SystemVerilog (`.sv`)
    SystemVerilog,
}

impl HdlLanguage {
    /// Detect the language from a file extension.
    ///
    /// Returns `None` for files without a recognized HDL extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "vhd" | "vhdl" => Some(HdlLanguage::Vhdl),
            "v" => Some(HdlLanguage::Verilog),
            "sv" => Some(HdlLanguage::SystemVerilog),
            _ => None,
        }
    }

    /// Get the language name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            HdlLanguage::Vhdl => "vhdl",
            HdlLanguage::Verilog => "verilog",
            HdlLanguage::SystemVerilog => "systemverilog",
        }
    }

    /// Whether the language belongs to the Verilog family.
    pub fn is_verilog_family(&self) -> bool {
        matches!(self, HdlLanguage::Verilog | HdlLanguage::SystemVerilog)
    }
}

impl std::fmt::Display for HdlLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Language of the design unit named `top`.
///
/// The top is assumed to live in the source whose file stem equals its name.
/// When no such file exists the last source in compile order is used, since
/// testbenches conventionally come last.
pub fn top_language(top: &str, sources: &[impl AsRef<Path>]) -> Option<HdlLanguage> {
    let by_stem = sources.iter().find(|src| {
        src.as_ref()
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem == top)
    });

    by_stem
        .or_else(|| sources.last())
        .and_then(|src| HdlLanguage::from_path(src.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(HdlLanguage::from_path(Path::new("a.vhd")), Some(HdlLanguage::Vhdl));
        assert_eq!(HdlLanguage::from_path(Path::new("a.VHDL")), Some(HdlLanguage::Vhdl));
        assert_eq!(HdlLanguage::from_path(Path::new("a.v")), Some(HdlLanguage::Verilog));
        assert_eq!(
            HdlLanguage::from_path(Path::new("a.sv")),
            Some(HdlLanguage::SystemVerilog)
        );
        assert_eq!(HdlLanguage::from_path(Path::new("a.txt")), None);
        assert_eq!(HdlLanguage::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_top_language_prefers_matching_stem() {
        let sources = vec![
            PathBuf::from("/rtl/adder.sv"),
            PathBuf::from("/tb/adder_tb.vhd"),
            PathBuf::from("/tb/helpers.v"),
        ];
        assert_eq!(top_language("adder_tb", &sources), Some(HdlLanguage::Vhdl));
        assert_eq!(top_language("adder", &sources), Some(HdlLanguage::SystemVerilog));
    }

    #[test]
    fn test_top_language_falls_back_to_last_source() {
        let sources = vec![PathBuf::from("/rtl/a.vhd"), PathBuf::from("/tb/b.v")];
        assert_eq!(top_language("unknown", &sources), Some(HdlLanguage::Verilog));
    }
}
