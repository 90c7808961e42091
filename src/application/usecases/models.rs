//! 에이전트/카테고리 모델 지정과 압축 모델 조회/저장.

use serde_json::Value;

use crate::application::config::ConfigLayout;
use crate::application::ports::DocumentStore;
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::model_mapping::{ModelMapping, apply_model_mapping};
use crate::domain::provider::{
    AvailableModel, available_models, compaction_model, set_compaction_model,
};

pub struct ModelAssignmentUseCase<'a> {
    pub store: &'a dyn DocumentStore,
    pub layout: &'a ConfigLayout,
}

impl<'a> ModelAssignmentUseCase<'a> {
    /// provider 레지스트리의 모든 `provider/model` 항목.
    pub fn list_available(&self) -> EngineResult<Vec<AvailableModel>> {
        let registry = self.require(&self.layout.provider_registry_path())?;
        Ok(available_models(&registry))
    }

    /// 지정된 역할의 `model`만 갱신한다.
    pub fn save_agent_models(&self, mapping: &ModelMapping) -> EngineResult<()> {
        let path = self.layout.behavior_registry_path();
        let mut behavior = self.require(&path)?;
        if mapping.is_empty() {
            return Ok(());
        }
        apply_model_mapping(&mut behavior, mapping);
        self.store.write_json(&path, &behavior)?;
        tracing::info!(
            agents = mapping.agents.len(),
            categories = mapping.categories.len(),
            "agent models saved"
        );
        Ok(())
    }

    /// 레지스트리가 아직 없으면 지정 없음(`None`)으로 본다.
    pub fn compaction_model(&self) -> EngineResult<Option<String>> {
        let registry = self.store.read_json(&self.layout.provider_registry_path())?;
        Ok(registry.as_ref().and_then(compaction_model))
    }

    /// `None`(또는 빈 문자열)이면 압축 모델 지정을 제거한다.
    pub fn save_compaction_model(&self, model: Option<&str>) -> EngineResult<()> {
        let path = self.layout.provider_registry_path();
        let mut registry = self.require(&path)?;
        set_compaction_model(&mut registry, model);
        self.store.write_json(&path, &registry)
    }

    fn require(&self, path: &std::path::Path) -> EngineResult<Value> {
        self.store
            .read_json(path)?
            .ok_or_else(|| EngineError::MissingDocument(path.to_path_buf()))
    }
}
