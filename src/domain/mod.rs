//! Domain layer
//! 문서 편집 규칙(마스킹/백업 식별/provider·모델 매핑)을 입출력 없이 표현한다.

pub mod backup;
pub mod credentials;
pub mod document;
pub mod error;
pub mod hosted;
pub mod model_mapping;
pub mod provider;
pub mod secret;
