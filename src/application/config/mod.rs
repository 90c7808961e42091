//! 애플리케이션이 사용하는 설정 스키마(순수 데이터)와 문서 경로 배치.
//!
//! 주의: 파일/환경변수 접근은 `infrastructure`에서만 수행한다.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::backup::ConfigType;

pub const DEFAULT_HOSTED_TIMEOUT_MS: u64 = 3000;

/// omoconf 자체 설정.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// 전역 기본값
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DefaultsConfig {
    /// opencode 설정 루트(기본: ~/.config/opencode)
    pub config_root: Option<String>,
    /// opencode 인증 파일 디렉터리(기본: ~/.local/share/opencode)
    pub auth_dir: Option<String>,
    /// 번들 템플릿 디렉터리
    pub templates_dir: Option<String>,
    /// 호스팅 서비스 API base URL(슬롯 상태에 값이 없을 때 사용)
    pub hosted_base_url: Option<String>,
    /// 호스팅 모델 목록 조회 타임아웃(ms)
    pub hosted_timeout_ms: Option<u64>,
}

impl AppConfig {
    pub fn hosted_timeout_ms(&self) -> u64 {
        self.defaults
            .hosted_timeout_ms
            .unwrap_or(DEFAULT_HOSTED_TIMEOUT_MS)
    }

    /// 후순위(나중 파일) 값으로 덮어쓰는 병합 규칙.
    pub fn merge_from(&mut self, other: AppConfig) {
        self.defaults.merge_from(other.defaults);
    }
}

impl DefaultsConfig {
    pub fn merge_from(&mut self, other: DefaultsConfig) {
        if other.config_root.is_some() {
            self.config_root = other.config_root;
        }
        if other.auth_dir.is_some() {
            self.auth_dir = other.auth_dir;
        }
        if other.templates_dir.is_some() {
            self.templates_dir = other.templates_dir;
        }
        if other.hosted_base_url.is_some() {
            self.hosted_base_url = other.hosted_base_url;
        }
        if other.hosted_timeout_ms.is_some() {
            self.hosted_timeout_ms = other.hosted_timeout_ms;
        }
    }
}

/// 설정 루트 기준 문서 배치.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigLayout {
    pub root: PathBuf,
    pub auth_dir: PathBuf,
    pub templates_dir: Option<PathBuf>,
    pub hosted_base_url: Option<String>,
}

impl ConfigLayout {
    /// 인증 디렉터리는 루트 하위 `auth`로 둔다(테스트/라이브러리 직접 호출용).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            auth_dir: root.join("auth"),
            root,
            templates_dir: None,
            hosted_base_url: None,
        }
    }

    pub fn with_auth_dir(mut self, auth_dir: impl Into<PathBuf>) -> Self {
        self.auth_dir = auth_dir.into();
        self
    }

    pub fn with_templates_dir(mut self, templates_dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(templates_dir.into());
        self
    }

    pub fn with_hosted_base_url(mut self, url: impl Into<String>) -> Self {
        self.hosted_base_url = Some(url.into());
        self
    }

    pub fn provider_registry_path(&self) -> PathBuf {
        self.root.join(ConfigType::Opencode.target_file())
    }

    pub fn behavior_registry_path(&self) -> PathBuf {
        self.root.join(ConfigType::Oh.target_file())
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.root.join(ConfigType::Credentials.target_file())
    }

    pub fn agents_md_path(&self) -> PathBuf {
        self.root.join("AGENTS.md")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    pub fn app_dir(&self) -> PathBuf {
        self.root.join("config-app")
    }

    pub fn hosted_state_path(&self) -> PathBuf {
        self.app_dir().join("hosted-config.json")
    }

    pub fn auth_path(&self) -> PathBuf {
        self.auth_dir.join("auth.json")
    }

    /// 최초 설정 시 기존 파일을 통째로 복사해 두는 디렉터리.
    pub fn setup_snapshot_dir(&self, timestamp: &str) -> PathBuf {
        self.root.join(format!("backup-{timestamp}"))
    }

    /// 백업 종류별 복원 대상 문서 경로.
    pub fn document_path(&self, config_type: ConfigType) -> PathBuf {
        self.root.join(config_type.target_file())
    }

    /// 최초 설정 전에 보존해야 하는 사용자 편집 파일.
    pub fn user_editable_files(&self) -> Vec<PathBuf> {
        vec![
            self.behavior_registry_path(),
            self.provider_registry_path(),
            self.agents_md_path(),
        ]
    }

    pub fn template_path(&self, file_name: &str) -> Option<PathBuf> {
        self.templates_dir.as_deref().map(|dir| dir.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_values_override() {
        let mut base = AppConfig::default();
        base.defaults.config_root = Some("/a".into());
        base.defaults.hosted_timeout_ms = Some(10);

        let mut next = AppConfig::default();
        next.defaults.config_root = Some("/b".into());
        base.merge_from(next);

        assert_eq!(base.defaults.config_root.as_deref(), Some("/b"));
        assert_eq!(base.hosted_timeout_ms(), 10);
    }

    #[test]
    fn layout_paths() {
        let layout = ConfigLayout::new("/cfg");
        assert_eq!(
            layout.document_path(ConfigType::Oh),
            PathBuf::from("/cfg/oh-my-opencode.json")
        );
        assert_eq!(
            layout.hosted_state_path(),
            PathBuf::from("/cfg/config-app/hosted-config.json")
        );
        assert_eq!(
            layout.setup_snapshot_dir("2025-01-01T00-00-00"),
            PathBuf::from("/cfg/backup-2025-01-01T00-00-00")
        );
    }
}
