//! 백업 스냅샷 식별 규칙.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::error::EngineError;

/// 백업 대상 문서 종류. 파일 이름 접두사와 복원 대상 문서를 함께 정의한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    Opencode,
    Oh,
    Credentials,
}

impl ConfigType {
    pub const ALL: [ConfigType; 3] = [
        ConfigType::Opencode,
        ConfigType::Oh,
        ConfigType::Credentials,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            ConfigType::Opencode => "opencode",
            ConfigType::Oh => "oh",
            ConfigType::Credentials => "credentials",
        }
    }

    /// 설정 루트 기준 복원 대상 파일 이름.
    pub fn target_file(self) -> &'static str {
        match self {
            ConfigType::Opencode => "opencode.json",
            ConfigType::Oh => "oh-my-opencode.json",
            ConfigType::Credentials => "credentials.json",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        ConfigType::ALL.into_iter().find(|t| t.prefix() == prefix)
    }

    /// 백업 파일 이름의 첫 `-` 앞부분으로 종류를 판별한다.
    pub fn from_backup_name(name: &str) -> Result<Self, EngineError> {
        let prefix = name.split('-').next().unwrap_or_default();
        Self::from_prefix(prefix).ok_or_else(|| EngineError::UnknownConfigType(prefix.to_string()))
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for ConfigType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_prefix(s.trim()).ok_or_else(|| EngineError::UnknownConfigType(s.to_string()))
    }
}

/// 백업 스냅샷 참조.
#[derive(Debug, Clone, Serialize)]
pub struct BackupRef {
    pub config_type: ConfigType,
    pub name: String,
    pub timestamp: String,
    pub path: PathBuf,
    pub size: u64,
    pub created: DateTime<Utc>,
}

/// ISO 시각에서 `:`/`.`를 `-`로 바꾸고 19자로 자른 타임스탬프.
pub fn backup_timestamp(at: DateTime<Utc>) -> String {
    let iso = at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
    iso.replace([':', '.'], "-").chars().take(19).collect()
}

pub fn backup_file_name(config_type: ConfigType, timestamp: &str) -> String {
    format!("{}-{timestamp}.json", config_type.prefix())
}

/// 파일 이름에서 타임스탬프 부분을 잘라낸다.
pub fn timestamp_of(config_type: ConfigType, name: &str) -> Option<String> {
    name.strip_prefix(config_type.prefix())?
        .strip_prefix('-')?
        .strip_suffix(".json")
        .map(ToString::to_string)
}

/// 백업 디렉터리 밖을 가리키는 이름은 허용하지 않는다.
pub fn is_safe_backup_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_replaces_separators_and_truncates() {
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(backup_timestamp(at), "2025-03-09T14-05-07");
        assert_eq!(
            backup_file_name(ConfigType::Oh, &backup_timestamp(at)),
            "oh-2025-03-09T14-05-07.json"
        );
    }

    #[test]
    fn resolves_type_from_backup_name() {
        assert_eq!(
            ConfigType::from_backup_name("opencode-2025-03-09T14-05-07.json").unwrap(),
            ConfigType::Opencode
        );
        assert_eq!(
            ConfigType::from_backup_name("oh-2025-03-09T14-05-07.json").unwrap(),
            ConfigType::Oh
        );
        let err = ConfigType::from_backup_name("agents-2025.json").unwrap_err();
        assert!(matches!(err, EngineError::UnknownConfigType(p) if p == "agents"));
    }

    #[test]
    fn extracts_timestamp() {
        let name = "credentials-2025-03-09T14-05-07.json";
        assert_eq!(
            timestamp_of(ConfigType::Credentials, name).as_deref(),
            Some("2025-03-09T14-05-07")
        );
        assert_eq!(timestamp_of(ConfigType::Oh, "opencode-x.json"), None);
    }

    #[test]
    fn rejects_path_like_names() {
        assert!(!is_safe_backup_name("../opencode.json"));
        assert!(!is_safe_backup_name("a/b.json"));
        assert!(is_safe_backup_name("oh-2025-03-09T14-05-07.json"));
    }
}
