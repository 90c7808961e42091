//! provider/behavior 레지스트리 두 문서를 함께 읽고 계산 후 순서대로 기록한다.

use std::path::PathBuf;

use serde_json::{Value, json};

use crate::application::config::ConfigLayout;
use crate::application::ports::DocumentStore;
use crate::domain::document::or_empty;
use crate::domain::error::EngineResult;

/// 문서가 없을 때의 기록 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AbsentDocument {
    /// 없던 문서는 만들지 않는다
    Skip,
    /// 편집 결과가 빈 객체가 아니면 새로 만든다
    Create,
}

/// 실제로 기록한 문서.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PairWrites {
    pub provider_registry: bool,
    pub behavior_registry: bool,
}

/// 편집 전 원본과 편집 중인 사본을 함께 들고 있는 두 레지스트리.
pub(crate) struct RegistryPair {
    registry_path: PathBuf,
    behavior_path: PathBuf,
    original_registry: Option<Value>,
    original_behavior: Option<Value>,
    pub registry: Value,
    pub behavior: Value,
}

impl RegistryPair {
    /// 두 문서를 모두 읽는다. 부재는 빈 문서, 파싱 실패는 기록 전에 중단한다.
    pub fn load(store: &dyn DocumentStore, layout: &ConfigLayout) -> EngineResult<Self> {
        let registry_path = layout.provider_registry_path();
        let behavior_path = layout.behavior_registry_path();
        let original_registry = store.read_json(&registry_path)?;
        let original_behavior = store.read_json(&behavior_path)?;
        Ok(Self {
            registry: or_empty(original_registry.clone()),
            behavior: or_empty(original_behavior.clone()),
            registry_path,
            behavior_path,
            original_registry,
            original_behavior,
        })
    }

    fn pending_writes(&self, missing: AbsentDocument) -> PairWrites {
        PairWrites {
            provider_registry: changed(self.original_registry.as_ref(), &self.registry, missing),
            behavior_registry: changed(self.original_behavior.as_ref(), &self.behavior, missing),
        }
    }

    /// provider → behavior 순서로 기록한다.
    /// behavior 기록이 실패하면 provider 레지스트리를 원래 상태로 되돌린다.
    pub fn persist(
        &self,
        store: &dyn DocumentStore,
        missing: AbsentDocument,
    ) -> EngineResult<PairWrites> {
        let writes = self.pending_writes(missing);
        if writes.provider_registry {
            store.write_json(&self.registry_path, &self.registry)?;
        }
        if writes.behavior_registry
            && let Err(err) = store.write_json(&self.behavior_path, &self.behavior)
        {
            if writes.provider_registry {
                self.roll_back_registry(store);
            }
            return Err(err);
        }
        Ok(writes)
    }

    fn roll_back_registry(&self, store: &dyn DocumentStore) {
        let result = match &self.original_registry {
            Some(prior) => store.write_json(&self.registry_path, prior),
            None => store.remove_file(&self.registry_path),
        };
        if let Err(rollback_err) = result {
            tracing::error!(
                error = %rollback_err,
                path = %self.registry_path.display(),
                "failed to roll back provider registry after behavior registry write failure"
            );
        }
    }
}

fn changed(original: Option<&Value>, next: &Value, missing: AbsentDocument) -> bool {
    match (original, missing) {
        (Some(prior), _) => prior != next,
        (None, AbsentDocument::Skip) => false,
        (None, AbsentDocument::Create) => *next != json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_documents_follow_policy() {
        let edited = json!({"provider": {}});
        assert!(!changed(None, &edited, AbsentDocument::Skip));
        assert!(changed(None, &edited, AbsentDocument::Create));
        assert!(!changed(None, &json!({}), AbsentDocument::Create));
        assert!(!changed(Some(&edited), &edited, AbsentDocument::Skip));
    }
}
