//! 적용 설정 진단(inspection) 뷰 모델.

use serde::Serialize;

use super::loader::LoadedConfig;
use crate::application::config::{ConfigLayout, DefaultsConfig};

#[derive(Debug, Clone, Serialize)]
pub struct ConfigInspection {
    pub searched_paths: Vec<String>,
    pub loaded_paths: Vec<String>,
    pub defaults: DefaultsConfig,
    pub effective: EffectiveLayout,
}

/// 기본값까지 반영한 실제 경로.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveLayout {
    pub config_root: String,
    pub root_exists: bool,
    pub auth_file: String,
    pub templates_dir: Option<String>,
    pub templates_exist: bool,
    pub hosted_base_url: Option<String>,
    pub hosted_timeout_ms: u64,
}

impl ConfigInspection {
    pub(crate) fn from_loaded(loaded: LoadedConfig, layout: &ConfigLayout) -> Self {
        let effective = EffectiveLayout {
            config_root: layout.root.display().to_string(),
            root_exists: layout.root.exists(),
            auth_file: layout.auth_path().display().to_string(),
            templates_dir: layout.templates_dir.as_ref().map(|d| d.display().to_string()),
            templates_exist: layout.templates_dir.as_ref().is_some_and(|d| d.exists()),
            hosted_base_url: layout.hosted_base_url.clone(),
            hosted_timeout_ms: loaded.config.hosted_timeout_ms(),
        };

        Self {
            searched_paths: loaded
                .searched_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            loaded_paths: loaded
                .loaded_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            defaults: loaded.config.defaults,
            effective,
        }
    }
}
