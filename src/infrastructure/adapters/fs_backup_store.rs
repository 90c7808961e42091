//! `backups/` 디렉터리 기반 백업 저장소 어댑터.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::application::ports::BackupStore;
use crate::domain::backup::{
    BackupRef, ConfigType, backup_file_name, backup_timestamp, timestamp_of,
};
use crate::domain::error::{EngineError, EngineResult};

pub struct FsBackupStore {
    dir: PathBuf,
}

impl FsBackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn describe(&self, config_type: ConfigType, name: &str) -> EngineResult<Option<BackupRef>> {
        let Some(timestamp) = timestamp_of(config_type, name) else {
            return Ok(None);
        };
        let path = self.dir.join(name);
        let meta = fs::metadata(&path).map_err(|e| EngineError::io(&path, e))?;
        if !meta.is_file() {
            return Ok(None);
        }
        let modified = meta
            .modified()
            .or_else(|_| meta.created())
            .map_err(|e| EngineError::io(&path, e))?;
        Ok(Some(BackupRef {
            config_type,
            name: name.to_string(),
            timestamp,
            path,
            size: meta.len(),
            created: DateTime::<Utc>::from(modified),
        }))
    }
}

impl BackupStore for FsBackupStore {
    fn save(
        &self,
        config_type: ConfigType,
        document: &Value,
        at: DateTime<Utc>,
    ) -> EngineResult<BackupRef> {
        fs::create_dir_all(&self.dir).map_err(|e| EngineError::io(&self.dir, e))?;

        let name = backup_file_name(config_type, &backup_timestamp(at));
        let path = self.dir.join(&name);
        let rendered = serde_json::to_string_pretty(document)
            .map_err(|e| EngineError::InvalidInput(e.to_string()))?;

        // 같은 초에 두 번 만들면 기존 백업을 덮어쓰지 않고 실패한다
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| EngineError::io(&path, e))?;
        file.write_all(format!("{rendered}\n").as_bytes())
            .map_err(|e| EngineError::io(&path, e))?;

        self.describe(config_type, &name)?
            .ok_or_else(|| EngineError::BackupNotFound(name))
    }

    fn list(&self, config_type: ConfigType) -> EngineResult<Vec<BackupRef>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(EngineError::io(&self.dir, e)),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::io(&self.dir, e))?;
            let Some(name) = entry.file_name().to_str().map(ToString::to_string) else {
                continue;
            };
            if let Some(backup) = self.describe(config_type, &name)? {
                backups.push(backup);
            }
        }

        backups.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
        Ok(backups)
    }

    fn load(&self, name: &str) -> EngineResult<Value> {
        let path = self.dir.join(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(EngineError::BackupNotFound(name.to_string()));
            }
            Err(e) => return Err(EngineError::io(&path, e)),
        };
        serde_json::from_str(&raw).map_err(|e| EngineError::InvalidBackup(format!("{name}: {e}")))
    }

    fn snapshot_if_exists(
        &self,
        sources: &[PathBuf],
        dest_dir: &Path,
    ) -> EngineResult<Option<PathBuf>> {
        let existing: Vec<&PathBuf> = sources.iter().filter(|p| p.is_file()).collect();
        if existing.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(dest_dir).map_err(|e| EngineError::io(dest_dir, e))?;
        for src in existing {
            let Some(file_name) = src.file_name() else {
                continue;
            };
            let dst = dest_dir.join(file_name);
            fs::copy(src, &dst).map_err(|e| EngineError::io(&dst, e))?;
        }
        Ok(Some(dest_dir.to_path_buf()))
    }
}
