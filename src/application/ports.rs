//! 애플리케이션 계층이 의존하는 포트(추상 인터페이스) 모음.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::application::config::AppConfig;
use crate::domain::backup::{BackupRef, ConfigType};
use crate::domain::error::EngineResult;

/// JSON 문서/디렉터리 입출력 포트.
pub trait DocumentStore: Send + Sync {
    /// 디렉터리(상위 포함)를 만든다. 이미 있으면 아무것도 하지 않는다.
    fn ensure_dir(&self, path: &Path) -> EngineResult<()>;
    fn exists(&self, path: &Path) -> bool;
    /// 파일이 없으면 `None`, 파싱 실패는 `MalformedDocument`.
    fn read_json(&self, path: &Path) -> EngineResult<Option<Value>>;
    /// 키 순서를 유지한 2칸 들여쓰기로 파일 전체를 교체한다.
    fn write_json(&self, path: &Path, document: &Value) -> EngineResult<()>;
    fn read_text(&self, path: &Path) -> EngineResult<Option<String>>;
    fn write_text(&self, path: &Path, content: &str) -> EngineResult<()>;
    /// 바이트 그대로 복사한다.
    fn copy_file(&self, src: &Path, dst: &Path) -> EngineResult<()>;
    /// 파일을 지운다. 이미 없으면 아무것도 하지 않는다.
    fn remove_file(&self, path: &Path) -> EngineResult<()>;
}

/// 백업 스냅샷 저장소 포트.
pub trait BackupStore: Send + Sync {
    /// `<type>-<timestamp>.json`으로 저장한다. 같은 이름이 있으면 실패한다.
    fn save(
        &self,
        config_type: ConfigType,
        document: &Value,
        at: DateTime<Utc>,
    ) -> EngineResult<BackupRef>;
    /// 최신순 목록. 디렉터리가 없으면 빈 목록.
    fn list(&self, config_type: ConfigType) -> EngineResult<Vec<BackupRef>>;
    /// 백업 내용을 읽는다(`BackupNotFound` / `InvalidBackup`).
    fn load(&self, name: &str) -> EngineResult<Value>;
    /// 존재하는 원본이 하나라도 있으면 `dest_dir`에 그대로 복사한다.
    fn snapshot_if_exists(
        &self,
        sources: &[PathBuf],
        dest_dir: &Path,
    ) -> EngineResult<Option<PathBuf>>;
}

/// 현재 시각 공급 포트(백업 이름 결정용).
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// omoconf 자체 설정 로딩/점검 포트.
pub trait ConfigRepository: Send + Sync {
    fn load(&self) -> Result<AppConfig>;
    fn inspect_pretty_json(&self) -> Result<String>;
}

/// 호스팅 서비스의 모델 목록 조회 포트.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// 원격 목록 원본 항목(`{id}` 객체 또는 문자열)을 돌려준다.
    async fn fetch_models(
        &self,
        base_url: &str,
        api_key: &str,
        timeout_ms: u64,
    ) -> Result<Vec<Value>>;
}
