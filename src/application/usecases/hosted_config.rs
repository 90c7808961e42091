//! 호스팅 서비스 슬롯 적용/제거 유스케이스.

use serde::Serialize;
use serde_json::{Value, json};

use crate::application::config::ConfigLayout;
use crate::application::ports::{DocumentStore, ModelCatalog};
use crate::application::usecases::registry_pair::{AbsentDocument, PairWrites, RegistryPair};
use crate::domain::document::{coerce_object, or_empty};
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::hosted::{
    HOSTED_PROVIDER_ID, HostedState, apply_hosted, model_ids_from_remote, remove_hosted,
};
use crate::domain::provider::{normalize_base_url, remove_key};
use crate::domain::secret::mask_for_display;

/// 적용/제거 결과 요약.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostedReport {
    pub enabled: bool,
    pub plan: String,
    /// provider 항목에 기록한 모델 수(원격 목록이 없으면 `None`)
    pub models: Option<usize>,
    pub provider_registry_written: bool,
    pub behavior_registry_written: bool,
    /// 제거 시 지운 항목/참조 수
    pub removed_refs: usize,
}

/// 호스팅 슬롯 상태와 두 레지스트리 문서를 함께 갱신한다.
pub struct HostedConfigUseCase<'a> {
    pub store: &'a dyn DocumentStore,
    pub layout: &'a ConfigLayout,
    pub catalog: &'a dyn ModelCatalog,
}

impl<'a> HostedConfigUseCase<'a> {
    /// 저장된 슬롯 상태(키는 가림)를 반환한다.
    pub fn status(&self) -> EngineResult<Value> {
        let state = self.load_state()?;
        let view =
            serde_json::to_value(&state).map_err(|e| EngineError::InvalidInput(e.to_string()))?;
        Ok(mask_for_display(&view, &["apiKey"]))
    }

    pub fn set_base_url(&self, url: &str) -> EngineResult<()> {
        let mut state = self.load_state()?;
        state.base_url = normalize_base_url(url).unwrap_or_default();
        self.save_state(&state)
    }

    /// 원격 모델 목록을 조회한 뒤 적용한다. 조회 실패는 목록 없음으로 처리한다.
    pub async fn apply_with_catalog(
        &self,
        api_key: &str,
        plan: Option<&str>,
        timeout_ms: u64,
    ) -> EngineResult<HostedReport> {
        let remote = match self.effective_base_url(&self.load_state()?) {
            Some(base_url) => {
                match self.catalog.fetch_models(&base_url, api_key, timeout_ms).await {
                    Ok(models) => Some(models),
                    Err(err) => {
                        tracing::warn!(
                            error = %format!("{err:#}"),
                            "failed to fetch hosted models; keeping existing provider entry"
                        );
                        None
                    }
                }
            }
            None => {
                tracing::warn!("hosted base URL is not configured; skipping model fetch");
                None
            }
        };
        self.apply(api_key, plan, remote.as_deref())
    }

    /// 슬롯을 활성화하고, 원격 목록이 있으면 provider 항목을 기록한다.
    /// 모든 문서를 읽고 계산한 뒤 레지스트리 → 슬롯 상태 → 인증 파일 순서로 기록한다.
    pub fn apply(
        &self,
        api_key: &str,
        plan: Option<&str>,
        remote_models: Option<&[Value]>,
    ) -> EngineResult<HostedReport> {
        let mut state = self.load_state()?;
        state.activate(api_key, plan);
        if state.base_url.is_empty()
            && let Some(url) = self.effective_base_url(&state)
        {
            state.base_url = url;
        }
        let auth = self.auth_with_entry(Some(api_key))?;
        let mut pair = RegistryPair::load(self.store, self.layout)?;

        let model_ids = remote_models.map(model_ids_from_remote);
        apply_hosted(&mut pair.registry, &state, model_ids.as_deref());

        let writes = self.persist(&pair, &state, auth.as_ref())?;
        tracing::info!(
            plan = %state.plan,
            models = ?model_ids.as_ref().map(Vec::len),
            "hosted config applied"
        );
        Ok(HostedReport {
            enabled: true,
            plan: state.plan.clone(),
            models: model_ids.map(|ids| ids.len()),
            provider_registry_written: writes.provider_registry,
            behavior_registry_written: writes.behavior_registry,
            removed_refs: 0,
        })
    }

    /// 슬롯을 비활성화하고 키를 지운 뒤 호스팅 provider와 그 참조를 제거한다.
    pub fn remove(&self) -> EngineResult<HostedReport> {
        let mut state = self.load_state()?;
        state.deactivate();
        let auth = self.auth_with_entry(None)?;
        let mut pair = RegistryPair::load(self.store, self.layout)?;

        let removed = remove_hosted(&mut pair.registry, &mut pair.behavior);

        let writes = self.persist(&pair, &state, auth.as_ref())?;
        tracing::info!(removed, "hosted config removed");
        Ok(HostedReport {
            enabled: false,
            plan: state.plan,
            models: None,
            provider_registry_written: writes.provider_registry,
            behavior_registry_written: writes.behavior_registry,
            removed_refs: removed,
        })
    }

    fn persist(
        &self,
        pair: &RegistryPair,
        state: &HostedState,
        auth: Option<&Value>,
    ) -> EngineResult<PairWrites> {
        let writes = pair.persist(self.store, AbsentDocument::Create)?;
        self.save_state(state)?;
        if let Some(auth) = auth {
            self.store.write_json(&self.layout.auth_path(), auth)?;
        }
        Ok(writes)
    }

    fn effective_base_url(&self, state: &HostedState) -> Option<String> {
        normalize_base_url(&state.base_url).or_else(|| {
            self.layout
                .hosted_base_url
                .as_deref()
                .and_then(normalize_base_url)
        })
    }

    fn load_state(&self) -> EngineResult<HostedState> {
        let path = self.layout.hosted_state_path();
        let Some(raw) = self.store.read_json(&path)? else {
            return Ok(HostedState::default());
        };
        serde_json::from_value(raw).map_err(|e| EngineError::malformed(&path, e))
    }

    fn save_state(&self, state: &HostedState) -> EngineResult<()> {
        let value =
            serde_json::to_value(state).map_err(|e| EngineError::InvalidInput(e.to_string()))?;
        self.store.write_json(&self.layout.hosted_state_path(), &value)
    }

    /// 호스팅 키를 넣거나(`Some`) 뺀(`None`) 인증 문서. 바뀌지 않으면 `None`.
    fn auth_with_entry(&self, api_key: Option<&str>) -> EngineResult<Option<Value>> {
        let path = self.layout.auth_path();
        let (mut auth, before) = match self.store.read_json(&path) {
            Ok(doc) => {
                let doc = or_empty(doc);
                (doc.clone(), Some(doc))
            }
            Err(EngineError::MalformedDocument { .. }) => {
                tracing::warn!(path = %path.display(), "auth file is malformed; rewriting");
                (json!({}), None)
            }
            Err(err) => return Err(err),
        };
        let map = coerce_object(&mut auth);
        match api_key {
            Some(key) => {
                map.insert(HOSTED_PROVIDER_ID.into(), json!({"type": "api", "key": key}));
            }
            None => {
                remove_key(map, HOSTED_PROVIDER_ID);
            }
        }
        if before.as_ref() == Some(&auth) {
            return Ok(None);
        }
        Ok(Some(auth))
    }
}
