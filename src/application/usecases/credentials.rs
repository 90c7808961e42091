//! 자격 증명 마스킹 뷰 조회/저장 유스케이스.

use serde_json::Value;

use crate::application::config::ConfigLayout;
use crate::application::ports::DocumentStore;
use crate::domain::credentials::{CredentialDomain, apply_save, masked_view};
use crate::domain::document::or_empty;
use crate::domain::error::EngineResult;

/// credentials.json 의 도메인별 뷰를 다룬다.
pub struct CredentialsUseCase<'a> {
    pub store: &'a dyn DocumentStore,
    pub layout: &'a ConfigLayout,
}

impl<'a> CredentialsUseCase<'a> {
    /// 비밀 필드를 플레이스홀더로 가린 뷰를 반환한다.
    pub fn masked_view(&self, domain: CredentialDomain) -> EngineResult<Value> {
        let store = or_empty(self.store.read_json(&self.layout.credentials_path())?);
        masked_view(&store, domain)
    }

    /// 편집된 뷰를 저장한다. 플레이스홀더 그대로인 필드는 기존 값을 유지한다.
    pub fn save(&self, domain: CredentialDomain, record: Value) -> EngineResult<()> {
        let path = self.layout.credentials_path();
        let mut store = or_empty(self.store.read_json(&path)?);
        apply_save(&mut store, domain, record)?;
        self.store.write_json(&path, &store)?;
        tracing::info!(domain = %domain, "credentials saved");
        Ok(())
    }
}
