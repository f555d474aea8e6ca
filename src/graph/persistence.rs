//! Binary persistence for the graph index.
//!
//! Layout on disk: 4 magic bytes, a little-endian u32 format version, then
//! the bincode payload. Writes go to a sibling temp file first and are
//! renamed into place so a crash mid-save never leaves a torn index.

use super::index::GraphIndex;
use crate::error::{NormalizeError, NormalizeResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MAGIC_BYTES: &[u8; 4] = b"SYMG";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;

const INDEX_FILE: &str = "graph.idx";

/// Manages the on-disk location of a persisted graph index.
pub struct IndexPersistence {
    base_path: PathBuf,
}

impl IndexPersistence {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn index_file(&self) -> PathBuf {
        self.base_path.join(INDEX_FILE)
    }

    pub fn exists(&self) -> bool {
        self.index_file().is_file()
    }

    pub fn save(&self, index: &GraphIndex) -> NormalizeResult<()> {
        let path = self.index_file();
        fs::create_dir_all(&self.base_path).map_err(|e| NormalizeError::Persistence {
            path: self.base_path.clone(),
            source: Box::new(e),
        })?;

        let payload = bincode::serde::encode_to_vec(index, bincode::config::standard()).map_err(
            |e| NormalizeError::Persistence {
                path: path.clone(),
                source: Box::new(e),
            },
        )?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC_BYTES);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&payload);

        let tmp = path.with_extension("idx.tmp");
        fs::write(&tmp, &bytes).map_err(|e| NormalizeError::Persistence {
            path: tmp.clone(),
            source: Box::new(e),
        })?;
        fs::rename(&tmp, &path).map_err(|e| NormalizeError::Persistence {
            path: path.clone(),
            source: Box::new(e),
        })?;

        info!(
            symbols = index.symbol_count(),
            bytes = bytes.len(),
            path = %path.display(),
            "saved graph index"
        );
        Ok(())
    }

    pub fn load(&self) -> NormalizeResult<GraphIndex> {
        load_from(&self.index_file())
    }

    /// Remove the persisted index if present.
    pub fn clear(&self) -> NormalizeResult<()> {
        let path = self.index_file();
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| NormalizeError::Persistence {
                path,
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}

fn load_from(path: &Path) -> NormalizeResult<GraphIndex> {
    let bytes = fs::read(path).map_err(|e| NormalizeError::Load {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    if bytes.len() < HEADER_LEN {
        return Err(NormalizeError::IndexCorrupted {
            reason: format!("file too short: {} bytes", bytes.len()),
        });
    }
    if &bytes[..4] != MAGIC_BYTES {
        return Err(NormalizeError::IndexCorrupted {
            reason: "bad magic bytes".to_string(),
        });
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        return Err(NormalizeError::IndexCorrupted {
            reason: format!("unsupported format version {version}, expected {FORMAT_VERSION}"),
        });
    }

    let (index, consumed): (GraphIndex, usize) =
        bincode::serde::decode_from_slice(&bytes[HEADER_LEN..], bincode::config::standard())
            .map_err(|e| NormalizeError::IndexCorrupted {
                reason: e.to_string(),
            })?;
    debug!(
        symbols = index.symbol_count(),
        consumed, "loaded graph index"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;
    use crate::types::SymbolKind;

    fn class(fqname: &str, superclass: Option<&str>) -> Symbol {
        let name = fqname.rsplit("::").next().unwrap_or(fqname);
        let mut symbol = Symbol::new(SymbolKind::Class, name, fqname);
        symbol.superclass = superclass.map(str::to_string);
        symbol
    }

    fn sample_index() -> GraphIndex {
        let mut index = GraphIndex::default();
        index.add_symbol(class("Base", None));
        index.add_symbol(class("App::User", Some("Base")));
        index.add_symbol(class("App::AdminUser", Some("App::User")));
        index.add_call_edge("App::AdminUser", "Base", 6);
        index
    }

    #[test]
    fn test_round_trip_preserves_queries() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = IndexPersistence::new(dir.path());
        let index = sample_index();

        let before_ancestors = index.ancestors_of("App::AdminUser");
        let before_metrics = index.metrics_of("Base").unwrap();

        persistence.save(&index).unwrap();
        assert!(persistence.exists());

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.symbol_count(), 3);
        assert_eq!(loaded.ancestors_of("App::AdminUser"), before_ancestors);
        assert_eq!(loaded.metrics_of("Base").unwrap(), before_metrics);
        assert_eq!(loaded.find_symbol("AdminUser").unwrap().fqname, "App::AdminUser");
        assert_eq!(loaded.callers_of("Base"), index.callers_of("Base"));
    }

    #[test]
    fn test_round_trip_with_unset_optional_fields() {
        // superclass, file_path, and method all None; the binary codec has
        // no field names, so optionals must always be encoded
        let dir = tempfile::tempdir().unwrap();
        let persistence = IndexPersistence::new(dir.path());
        let mut index = GraphIndex::default();
        index.add_symbol(Symbol::new(SymbolKind::Class, "Bare", "Bare"));
        persistence.save(&index).unwrap();

        let loaded = persistence.load().unwrap();
        let bare = loaded.find_symbol("Bare").unwrap();
        assert_eq!(bare.superclass, None);
        assert_eq!(bare.file_path, None);
        assert!(bare.method.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = IndexPersistence::new(dir.path());
        let err = persistence.load().unwrap_err();
        assert_eq!(err.status_code(), "LOAD_ERROR");
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = IndexPersistence::new(dir.path());
        std::fs::write(persistence.index_file(), b"NOPE\x01\x00\x00\x00junk").unwrap();
        let err = persistence.load().unwrap_err();
        assert_eq!(err.status_code(), "INDEX_CORRUPTED");
    }

    #[test]
    fn test_wrong_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = IndexPersistence::new(dir.path());
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC_BYTES);
        bytes.extend_from_slice(&99u32.to_le_bytes());
        std::fs::write(persistence.index_file(), &bytes).unwrap();
        let err = persistence.load().unwrap_err();
        assert!(matches!(err, NormalizeError::IndexCorrupted { .. }));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = IndexPersistence::new(dir.path());
        persistence.save(&sample_index()).unwrap();

        let path = persistence.index_file();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(persistence.load().is_err());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = IndexPersistence::new(dir.path());
        persistence.save(&sample_index()).unwrap();
        assert!(persistence.exists());
        persistence.clear().unwrap();
        assert!(!persistence.exists());
        // clearing twice is fine
        persistence.clear().unwrap();
    }
}
