//! provider 이름/주소 변경을 두 레지스트리 문서에 전파하는 유스케이스.

use serde::Serialize;

use crate::application::config::ConfigLayout;
use crate::application::ports::DocumentStore;
use crate::application::usecases::registry_pair::{AbsentDocument, RegistryPair};
use crate::domain::error::EngineResult;
use crate::domain::model_mapping::{
    apply_model_mapping, match_models_to_agents, rewrite_provider_refs,
};
use crate::domain::provider::{
    DEFAULT_PROVIDER_ID, ProviderRequest, merge_provider_fields, provider_models,
    resolve_provider_identity,
};

/// 조정 결과 요약.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// 요청이 비어 아무것도 하지 않았는지 여부
    pub skipped: bool,
    pub provider_id: String,
    /// 기본 provider 항목을 새 키로 옮겼는지 여부
    pub moved: bool,
    pub provider_registry_written: bool,
    pub behavior_registry_written: bool,
    /// 휴리스틱 매핑으로 갱신한 역할 수
    pub mapped_roles: usize,
    /// 접두사 재작성으로 갱신한 참조 수
    pub rewritten_refs: usize,
}

/// 로드 → 식별자 해석 → 필드 병합 → 매핑 전파 → 저장 순서로 실행한다.
/// 두 문서의 새 상태를 메모리에서 모두 계산한 뒤에만 기록한다.
pub struct ReconcileProviderUseCase<'a> {
    pub store: &'a dyn DocumentStore,
    pub layout: &'a ConfigLayout,
}

impl<'a> ReconcileProviderUseCase<'a> {
    pub fn execute(
        &self,
        provider_name: Option<&str>,
        base_url: Option<&str>,
    ) -> EngineResult<ReconcileReport> {
        let request = ProviderRequest::new(provider_name, base_url);
        if request.is_empty() {
            tracing::debug!("no provider name or base URL supplied; reconciliation skipped");
            return Ok(ReconcileReport {
                skipped: true,
                ..Default::default()
            });
        }

        // 1. 로드(부재는 빈 문서, 파싱 실패는 중단)
        let mut pair = RegistryPair::load(self.store, self.layout)?;

        // 2~3. 식별자 해석과 필드 병합
        let resolution = resolve_provider_identity(&mut pair.registry, &request);
        let provider_id = resolution.provider_id.clone();
        if !merge_provider_fields(&mut pair.registry, &provider_id, &request) {
            tracing::warn!(provider = %provider_id, "provider entry not found; fields not applied");
        }

        // 5. 매핑 전파(휴리스틱 매핑 후 남은 옛 접두사 참조를 정리)
        let models = provider_models(&pair.registry, &provider_id);
        let mut mapped_roles = 0;
        if let Some(mapping) = match_models_to_agents(&provider_id, &models) {
            mapped_roles = mapping.agents.len() + mapping.categories.len();
            apply_model_mapping(&mut pair.behavior, &mapping);
        }
        let rewritten_refs = if resolution.id_changed() {
            rewrite_provider_refs(&mut pair.behavior, DEFAULT_PROVIDER_ID, &provider_id)
        } else {
            0
        };

        // 4, 6. 있던 문서만 기록(behavior 실패 시 provider 레지스트리를 되돌린다)
        let writes = pair.persist(self.store, AbsentDocument::Skip)?;

        tracing::info!(
            provider = %provider_id,
            moved = resolution.moved,
            mapped_roles,
            rewritten_refs,
            "provider reconciled"
        );

        Ok(ReconcileReport {
            skipped: false,
            provider_id,
            moved: resolution.moved,
            provider_registry_written: writes.provider_registry,
            behavior_registry_written: writes.behavior_registry,
            mapped_roles,
            rewritten_refs,
        })
    }
}
