//! Compile-order files.
//!
//! One source path per line, in the order the tools must analyze them. Blank
//! lines and lines starting with `#` are skipped. Relative entries are
//! resolved against the directory holding the file, so a compile order can
//! be checked in next to the sources it lists.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CompileOrderError {
    #[error("compile order file not found: {}", path.display())]
    #[diagnostic(
        code(hdlflow::compile_order::not_found),
        help("paths are resolved against the current directory")
    )]
    NotFound { path: PathBuf },

    #[error("failed to read compile order file {}", path.display())]
    #[diagnostic(code(hdlflow::compile_order::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `path` itself when absolute, otherwise `path` below `base`.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Parse compile-order text. `base` is the directory relative entries are
/// resolved against.
pub fn parse_compile_order(text: &str, base: &Path) -> Vec<PathBuf> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| resolve_path(Path::new(line), base))
        .collect()
}

/// Read a compile-order file. A relative `path` is taken relative to `cwd`.
pub fn read_compile_order(path: &Path, cwd: &Path) -> Result<Vec<PathBuf>, CompileOrderError> {
    let path = resolve_path(path, cwd);
    if !path.is_file() {
        return Err(CompileOrderError::NotFound { path });
    }

    let text = std::fs::read_to_string(&path).map_err(|source| CompileOrderError::Read {
        path: path.clone(),
        source,
    })?;

    let base = path.parent().unwrap_or(cwd);
    let sources = parse_compile_order(&text, base);
    tracing::debug!(
        "read {} source(s) from {}",
        sources.len(),
        path.display()
    );
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let text = "# packages first\n\
                    pkg.vhd\n\
                    \n\
                    /abs/core.vhd\n\
                    \t  tb/core_tb.vhd  \n";
        let sources = parse_compile_order(text, Path::new("/proj"));
        assert_eq!(
            sources,
            vec![
                PathBuf::from("/proj/pkg.vhd"),
                PathBuf::from("/abs/core.vhd"),
                PathBuf::from("/proj/tb/core_tb.vhd"),
            ]
        );
    }

    #[test]
    fn test_read_relative_to_cwd() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("rtl")).unwrap();
        std::fs::write(tmp.path().join("rtl/order.txt"), "a.vhd\nb.vhd\n").unwrap();

        let sources = read_compile_order(Path::new("rtl/order.txt"), tmp.path()).unwrap();
        assert_eq!(
            sources,
            vec![tmp.path().join("rtl/a.vhd"), tmp.path().join("rtl/b.vhd")]
        );
    }

    #[test]
    fn test_read_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = read_compile_order(Path::new("missing.txt"), tmp.path()).unwrap_err();
        assert!(matches!(err, CompileOrderError::NotFound { .. }));
        assert!(err.to_string().contains("missing.txt"));
    }
}
