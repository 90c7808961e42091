//! 설정 파일 탐색/병합 로더.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::application::config::{AppConfig, ConfigLayout};

pub const CONFIG_ENV: &str = "OMOCONF_CONFIG";

#[derive(Debug, Clone)]
pub(crate) struct LoadedConfig {
    pub config: AppConfig,
    pub searched_paths: Vec<PathBuf>,
    pub loaded_paths: Vec<PathBuf>,
}

/// 우선순위 경로를 순회해 JSON 설정을 병합한다. 파일이 하나도 없으면 기본값을 쓴다.
pub(crate) fn load_merged_config() -> Result<LoadedConfig> {
    // 낮은 우선순위에서 높은 우선순위 순서로 병합한다.
    let mut merged = AppConfig::default();
    let mut loaded_paths = Vec::new();
    let paths = config_paths();

    for path in &paths {
        if !path.exists() {
            continue;
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let parsed: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse JSON in {}", path.display()))?;
        merged.merge_from(parsed);
        loaded_paths.push(path.to_path_buf());
    }

    Ok(LoadedConfig {
        config: merged,
        searched_paths: paths,
        loaded_paths,
    })
}

/// 기본 + 사용자 + 프로젝트 + 명시 경로 순으로 병합 경로를 구성한다.
pub fn config_paths() -> Vec<PathBuf> {
    // 낮은 우선순위 -> 높은 우선순위 순서로 병합됨.
    let mut paths = vec![PathBuf::from("/etc/omoconf/config.json")];

    if let Some(base) = dirs::config_dir() {
        paths.push(base.join("omoconf").join("config.json"));
    }

    paths.push(PathBuf::from(".omoconf/config.json"));

    if let Ok(path) = env::var(CONFIG_ENV) {
        paths.push(Path::new(&path).to_path_buf());
    }

    dedup_paths(paths)
}

/// 설정값과 홈 디렉터리로 문서 배치를 결정한다.
pub(crate) fn resolve_layout(config: &AppConfig) -> Result<ConfigLayout> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    let defaults = &config.defaults;

    let root = defaults
        .config_root
        .as_deref()
        .map(|p| expand_home(p, &home))
        .unwrap_or_else(|| home.join(".config").join("opencode"));
    let auth_dir = defaults
        .auth_dir
        .as_deref()
        .map(|p| expand_home(p, &home))
        .unwrap_or_else(|| home.join(".local").join("share").join("opencode"));
    let templates_dir = defaults
        .templates_dir
        .as_deref()
        .map(|p| expand_home(p, &home))
        .or_else(|| dirs::data_dir().map(|d| d.join("omoconf").join("templates")));

    let mut layout = ConfigLayout::new(root).with_auth_dir(auth_dir);
    if let Some(dir) = templates_dir {
        layout = layout.with_templates_dir(dir);
    }
    if let Some(url) = defaults.hosted_base_url.as_deref().filter(|u| !u.trim().is_empty()) {
        layout = layout.with_hosted_base_url(url.trim());
    }
    Ok(layout)
}

fn expand_home(raw: &str, home: &Path) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None if raw == "~" => home.to_path_buf(),
        None => PathBuf::from(raw),
    }
}

fn dedup_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for p in paths {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}
