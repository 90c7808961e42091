//! provider 레지스트리(opencode.json) 편집 규칙.

use serde::Serialize;
use serde_json::Value;

use crate::domain::document::{JsonMap, child_object, coerce_object, non_empty_str};

/// 템플릿에 들어 있는 기본 provider 식별자.
pub const DEFAULT_PROVIDER_ID: &str = "unified-proxy";

/// provider 이름/주소 변경 요청(정규화 완료 상태).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRequest {
    /// 사용자 표시 이름(trim 완료)
    pub display_name: Option<String>,
    /// 끝 `/`를 제거한 base URL
    pub base_url: Option<String>,
}

impl ProviderRequest {
    pub fn new(provider_name: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            display_name: provider_name
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string),
            base_url: base_url.and_then(normalize_base_url),
        }
    }

    /// 이름도 주소도 없으면 조정할 것이 없다.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.base_url.is_none()
    }

    pub fn provider_id(&self) -> String {
        normalize_provider_id(self.display_name.as_deref().unwrap_or(DEFAULT_PROVIDER_ID))
    }
}

/// 소문자화 후 공백 묶음을 `-`로 치환한다.
pub fn normalize_provider_id(raw: &str) -> String {
    let id = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    if id.is_empty() {
        DEFAULT_PROVIDER_ID.to_string()
    } else {
        id
    }
}

/// trim 후 끝 `/`를 모두 제거한다. 비면 미지정으로 본다.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

/// 식별자 해석 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResolution {
    pub provider_id: String,
    /// 기본 키의 항목을 새 키로 옮겼는지 여부
    pub moved: bool,
}

impl ProviderResolution {
    /// 기본 식별자에서 바뀌었는지(참조 재작성 필요 여부).
    pub fn id_changed(&self) -> bool {
        self.provider_id != DEFAULT_PROVIDER_ID
    }
}

pub fn providers_mut(registry: &mut Value) -> &mut JsonMap {
    child_object(coerce_object(registry), "provider")
}

pub fn providers(registry: &Value) -> Option<&JsonMap> {
    registry.get("provider").and_then(Value::as_object)
}

/// 기본 키 항목을 새 식별자로 옮긴다. 새 키가 이미 있으면 기존 항목이 우선한다.
pub fn resolve_provider_identity(
    registry: &mut Value,
    request: &ProviderRequest,
) -> ProviderResolution {
    let provider_id = request.provider_id();
    let mut moved = false;
    if provider_id != DEFAULT_PROVIDER_ID
        && let Some(providers) = registry.get_mut("provider").and_then(Value::as_object_mut)
        && providers.contains_key(DEFAULT_PROVIDER_ID)
    {
        if providers.contains_key(&provider_id) {
            tracing::warn!(
                provider = %provider_id,
                "provider already exists; keeping existing entry instead of moving the default one"
            );
        } else {
            rename_key(providers, DEFAULT_PROVIDER_ID, &provider_id);
            moved = true;
        }
    }

    ProviderResolution { provider_id, moved }
}

/// 요청에 들어 있는 필드만 provider 항목에 덮어쓴다. 항목이 없으면 false.
pub fn merge_provider_fields(
    registry: &mut Value,
    provider_id: &str,
    request: &ProviderRequest,
) -> bool {
    let Some(entry) = registry
        .get_mut("provider")
        .and_then(Value::as_object_mut)
        .and_then(|providers| providers.get_mut(provider_id))
    else {
        return false;
    };
    let entry = coerce_object(entry);

    if let Some(base_url) = &request.base_url {
        child_object(entry, "options").insert("baseURL".into(), Value::String(base_url.clone()));
    }
    if let Some(name) = &request.display_name {
        entry.insert("name".into(), Value::String(name.clone()));
    }
    true
}

/// provider의 모델 맵을 복사해 돌려준다.
pub fn provider_models(registry: &Value, provider_id: &str) -> JsonMap {
    providers(registry)
        .and_then(|p| p.get(provider_id))
        .and_then(|entry| entry.get("models"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// 위치를 유지한 채 키 이름만 바꾼다.
pub fn rename_key(map: &mut JsonMap, old: &str, new: &str) {
    let entries = std::mem::take(map);
    *map = entries
        .into_iter()
        .map(|(key, value)| {
            if key == old {
                (new.to_string(), value)
            } else {
                (key, value)
            }
        })
        .collect();
}

/// 다른 키의 순서를 흔들지 않고 제거한다.
pub fn remove_key(map: &mut JsonMap, key: &str) -> Option<Value> {
    if !map.contains_key(key) {
        return None;
    }
    let mut removed = None;
    let entries = std::mem::take(map);
    *map = entries
        .into_iter()
        .filter_map(|(k, v)| {
            if k == key {
                removed = Some(v);
                None
            } else {
                Some((k, v))
            }
        })
        .collect();
    removed
}

/// 선택 가능한 `provider/model` 항목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableModel {
    pub id: String,
    pub name: String,
    pub provider: String,
}

pub fn available_models(registry: &Value) -> Vec<AvailableModel> {
    let mut out = Vec::new();
    let Some(providers) = providers(registry) else {
        return out;
    };
    for (provider_id, entry) in providers {
        let Some(models) = entry.get("models").and_then(Value::as_object) else {
            continue;
        };
        for (model_id, spec) in models {
            out.push(AvailableModel {
                id: format!("{provider_id}/{model_id}"),
                name: non_empty_str(spec.get("name")).unwrap_or(model_id).to_string(),
                provider: provider_id.clone(),
            });
        }
    }
    out
}

/// `agent.compaction.model`을 읽는다. `{providerID, modelID}` 형태도 허용한다.
pub fn compaction_model(registry: &Value) -> Option<String> {
    let model = registry.pointer("/agent/compaction/model")?;
    if let Some(s) = model.as_str() {
        return (!s.is_empty()).then(|| s.to_string());
    }
    let provider = non_empty_str(model.get("providerID"))?;
    let model_id = non_empty_str(model.get("modelID"))?;
    Some(format!("{provider}/{model_id}"))
}

/// 압축(compaction) 모델을 지정하거나, `None`이면 제거한다.
pub fn set_compaction_model(registry: &mut Value, model: Option<&str>) {
    let root = coerce_object(registry);
    match model.map(str::trim).filter(|m| !m.is_empty()) {
        Some(model) => {
            let mut compaction = JsonMap::new();
            compaction.insert("model".into(), Value::String(model.to_string()));
            child_object(root, "agent").insert("compaction".into(), Value::Object(compaction));
        }
        None => {
            let emptied = match root.get_mut("agent").and_then(Value::as_object_mut) {
                Some(agent) => {
                    remove_key(agent, "compaction");
                    agent.is_empty()
                }
                None => false,
            };
            if emptied {
                remove_key(root, "agent");
            }
        }
    }
}
