//! omoconf library root.
//! opencode / oh-my-opencode 설정 문서를 서로 일관되게 유지하는 조정 엔진.
//! Clean Architecture + DDD 계층을 외부에 노출한다.

use anyhow::Result;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;

pub use application::config::ConfigLayout;
pub use domain::error::{EngineError, EngineResult, ErrorKind};
pub use interface::composition::AppComposition;

/// 병합된 omoconf 설정으로 조립한 엔진을 돌려준다.
pub fn engine() -> Result<AppComposition> {
    AppComposition::from_settings()
}

/// 설정 점검 JSON 출력용 함수.
pub fn inspect_settings_pretty_json() -> Result<String> {
    infrastructure::config::inspect_pretty_json()
}
