//! 호스팅 서비스 슬롯(단일 provider 항목) 적용/제거 규칙.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::document::{JsonMap, child_object, coerce_object};
use crate::domain::model_mapping::remove_provider_refs;
use crate::domain::provider::{compaction_model, providers_mut, remove_key, set_compaction_model};

/// 호스팅 provider의 고정 식별자.
pub const HOSTED_PROVIDER_ID: &str = "hosted";
pub const HOSTED_PROVIDER_NAME: &str = "Hosted Service";
pub const DEFAULT_PLAN: &str = "free";

/// config-app/hosted-config.json 에 저장되는 슬롯 상태.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedState {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    /// 알 수 없는 필드는 그대로 보존한다
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl HostedState {
    /// 슬롯을 활성화하고 키/요금제를 기록한다.
    pub fn activate(&mut self, api_key: &str, plan: Option<&str>) {
        self.enabled = true;
        self.api_key = api_key.to_string();
        self.plan = plan
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ToString::to_string)
            .or_else(|| Some(self.plan.clone()).filter(|p| !p.is_empty()))
            .unwrap_or_else(|| DEFAULT_PLAN.to_string());
    }

    pub fn deactivate(&mut self) {
        self.enabled = false;
        self.api_key.clear();
    }
}

/// 원격 모델 목록 항목(`{id}` 객체 또는 문자열)에서 모델 식별자를 뽑는다.
pub fn model_ids_from_remote(entries: &[Value]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for entry in entries {
        let id = match entry {
            Value::String(s) => Some(s.as_str()),
            other => other.get("id").and_then(Value::as_str),
        };
        if let Some(id) = id.map(str::trim).filter(|s| !s.is_empty())
            && !out.iter().any(|seen| seen == id)
        {
            out.push(id.to_string());
        }
    }
    out
}

/// 호스팅 provider 항목을 provider 레지스트리에 반영한다.
/// 원격 목록이 없으면 기존 provider 항목을 그대로 둔다.
/// behavior 레지스트리의 역할 매핑은 건드리지 않는다.
pub fn apply_hosted(registry: &mut Value, state: &HostedState, remote_models: Option<&[String]>) {
    let Some(model_ids) = remote_models else {
        return;
    };

    let providers = providers_mut(registry);
    let entry = coerce_object(
        providers
            .entry(HOSTED_PROVIDER_ID.to_string())
            .or_insert_with(|| json!({})),
    );
    entry.insert("name".into(), json!(HOSTED_PROVIDER_NAME));
    entry
        .entry("npm".to_string())
        .or_insert_with(|| json!("@ai-sdk/openai-compatible"));
    if !state.base_url.trim().is_empty() {
        let base_url = state.base_url.trim().trim_end_matches('/');
        child_object(entry, "options").insert("baseURL".into(), json!(base_url));
    }

    let mut models = JsonMap::new();
    for id in model_ids {
        models.insert(id.clone(), json!({ "name": id }));
    }
    entry.insert("models".into(), Value::Object(models));
}

/// 호스팅 provider 항목과 그것만 가리키던 참조를 제거한다.
pub fn remove_hosted(registry: &mut Value, behavior: &mut Value) -> usize {
    let prefix = format!("{HOSTED_PROVIDER_ID}/");
    let mut removed = 0;

    if let Some(providers) = registry.get_mut("provider").and_then(Value::as_object_mut)
        && remove_key(providers, HOSTED_PROVIDER_ID).is_some()
    {
        removed += 1;
    }

    let root = coerce_object(registry);
    for key in ["model", "small_model"] {
        if root
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|m| m.starts_with(&prefix))
        {
            remove_key(root, key);
            removed += 1;
        }
    }
    if compaction_model(registry).is_some_and(|m| m.starts_with(&prefix)) {
        set_compaction_model(registry, None);
        removed += 1;
    }

    removed + remove_provider_refs(behavior, HOSTED_PROVIDER_ID)
}
