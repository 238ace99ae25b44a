//! File loading for resources (fonts, shader sources).

use std::path::Path;

use crate::error::{Error, Result};

/// Reads a whole file into memory.
///
/// Any I/O failure is reported as [`Error::FileNotFound`] with the OS reason.
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| Error::FileNotFound {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Reads a UTF-8 text file (e.g. WGSL source).
pub fn load_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = load_file(path)?;
    String::from_utf8(bytes).map_err(|e| Error::FileNotFound {
        path: path.to_path_buf(),
        reason: format!("not valid UTF-8: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("fresco-asset-{}-{name}", std::process::id()))
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let path = scratch("does-not-exist.bin");
        match load_file(&path) {
            Err(Error::FileNotFound { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn reads_bytes_and_text() {
        let path = scratch("shader.wgsl");
        std::fs::write(&path, "@vertex fn vs_main() {}").unwrap();
        assert_eq!(load_file(&path).unwrap().len(), 23);
        assert!(load_text(&path).unwrap().starts_with("@vertex"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn binary_is_not_text() {
        let path = scratch("blob.bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(load_text(&path), Err(Error::FileNotFound { .. })));
        std::fs::remove_file(&path).unwrap();
    }
}
