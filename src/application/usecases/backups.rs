//! 백업 생성/목록/복원 유스케이스.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::application::config::ConfigLayout;
use crate::application::ports::{BackupStore, Clock, DocumentStore};
use crate::domain::backup::{BackupRef, ConfigType, is_safe_backup_name};
use crate::domain::error::{EngineError, EngineResult};

/// 복원 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreOutcome {
    pub config_type: ConfigType,
    pub target_path: PathBuf,
}

pub struct BackupUseCase<'a> {
    pub store: &'a dyn DocumentStore,
    pub backups: &'a dyn BackupStore,
    pub clock: &'a dyn Clock,
    pub layout: &'a ConfigLayout,
}

impl<'a> BackupUseCase<'a> {
    /// 현재 대상 문서를 스냅샷한다. 문서가 없으면 `MissingDocument`.
    pub fn create(&self, config_type: ConfigType) -> EngineResult<BackupRef> {
        let path = self.layout.document_path(config_type);
        let document = self
            .store
            .read_json(&path)?
            .ok_or(EngineError::MissingDocument(path))?;
        self.backup_document(config_type, &document)
    }

    /// 주어진 문서를 그대로 스냅샷한다.
    pub fn backup_document(
        &self,
        config_type: ConfigType,
        document: &Value,
    ) -> EngineResult<BackupRef> {
        let backup = self.backups.save(config_type, document, self.clock.now())?;
        tracing::info!(name = %backup.name, size = backup.size, "backup created");
        Ok(backup)
    }

    pub fn list(&self, config_type: ConfigType) -> EngineResult<Vec<BackupRef>> {
        self.backups.list(config_type)
    }

    /// 백업 내용을 대상 문서에 덮어쓴다(마지막 기록이 이긴다).
    /// 최상위가 객체가 아닌 백업(`null` 등)은 `InvalidBackup`.
    pub fn restore(&self, name: &str) -> EngineResult<RestoreOutcome> {
        if !is_safe_backup_name(name) {
            return Err(EngineError::BackupNotFound(name.to_string()));
        }
        let document = self.backups.load(name)?;
        if !document.is_object() {
            return Err(EngineError::InvalidBackup(name.to_string()));
        }
        let config_type = ConfigType::from_backup_name(name)?;
        let target_path = self.layout.document_path(config_type);
        self.store.write_json(&target_path, &document)?;

        tracing::info!(name, target = %target_path.display(), "backup restored");
        Ok(RestoreOutcome {
            config_type,
            target_path,
        })
    }
}
