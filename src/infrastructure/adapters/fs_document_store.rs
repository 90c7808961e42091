//! 파일시스템 기반 문서 저장소 어댑터.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;

use crate::application::ports::DocumentStore;
use crate::domain::error::{EngineError, EngineResult};

/// JSON 문서를 임시 파일 + rename 으로 통째로 교체하는 저장소.
pub struct FsDocumentStore;

impl DocumentStore for FsDocumentStore {
    fn ensure_dir(&self, path: &Path) -> EngineResult<()> {
        fs::create_dir_all(path).map_err(|e| EngineError::io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_json(&self, path: &Path) -> EngineResult<Option<Value>> {
        let Some(raw) = self.read_text(path)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| EngineError::malformed(path, e))
    }

    fn write_json(&self, path: &Path, document: &Value) -> EngineResult<()> {
        let rendered = serde_json::to_string_pretty(document)
            .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
        self.write_text(path, &format!("{rendered}\n"))
    }

    fn read_text(&self, path: &Path) -> EngineResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EngineError::io(path, e)),
        }
    }

    fn write_text(&self, path: &Path, content: &str) -> EngineResult<()> {
        write_atomic(path, content.as_bytes())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> EngineResult<()> {
        let bytes = fs::read(src).map_err(|e| EngineError::io(src, e))?;
        write_atomic(dst, &bytes)
    }

    fn remove_file(&self, path: &Path) -> EngineResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::io(path, e)),
        }
    }
}

/// 같은 디렉터리의 임시 파일에 쓴 뒤 rename 한다.
/// 읽는 쪽은 반쯤 쓰인 파일을 보지 않는다.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> EngineResult<()> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document");
    let temp_path = parent.join(format!(".{file_name}.tmp-{}", std::process::id()));
    fs::write(&temp_path, bytes).map_err(|e| EngineError::io(&temp_path, e))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(EngineError::io(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore;
        assert!(store.read_json(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn malformed_file_is_not_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = FsDocumentStore.read_json(&path).unwrap_err();
        assert!(matches!(err, EngineError::MalformedDocument { .. }));
    }

    #[test]
    fn writes_two_space_indent_with_trailing_newline_in_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        FsDocumentStore
            .write_json(&path, &json!({"zeta": 1, "alpha": {"b": true}}))
            .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "{\n  \"zeta\": 1,\n  \"alpha\": {\n    \"b\": true\n  }\n}\n");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn copy_is_byte_exact() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.json");
        let dst = dir.path().join("out").join("dst.json");
        fs::write(&src, "{\"a\":1}   \n\n").unwrap();

        FsDocumentStore.copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), fs::read(&src).unwrap());
    }

    #[test]
    fn remove_ignores_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "{}").unwrap();

        FsDocumentStore.remove_file(&path).unwrap();
        assert!(!path.exists());
        FsDocumentStore.remove_file(&path).unwrap();
    }
}
