//! behavior 레지스트리(oh-my-opencode.json)의 모델 매핑 규칙.
//!
//! 모델 참조는 `"<providerId>/<modelId>"` 형태의 합성 식별자다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::document::{JsonMap, child_object, coerce_object};
use crate::domain::provider::remove_key;

/// behavior 레지스트리의 두 섹션.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Agents,
    Categories,
}

impl Section {
    pub fn key(self) -> &'static str {
        match self {
            Section::Agents => "agents",
            Section::Categories => "categories",
        }
    }
}

/// 역할별 모델 선호 힌트. 앞쪽 힌트가 우선한다.
struct RoleHint {
    section: Section,
    name: &'static str,
    hints: &'static [&'static str],
    /// 이미지 입력이 가능한 모델을 우선할지 여부
    wants_vision: bool,
}

#[rustfmt::skip]
const ROLE_HINTS: &[RoleHint] = &[
    RoleHint { section: Section::Agents, name: "sisyphus", hints: &["opus", "sonnet", "gpt-5", "gpt", "claude"], wants_vision: false },
    RoleHint { section: Section::Agents, name: "oracle", hints: &["gpt-5", "o3", "gpt", "opus"], wants_vision: false },
    RoleHint { section: Section::Agents, name: "librarian", hints: &["sonnet", "glm", "flash", "haiku", "mini"], wants_vision: false },
    RoleHint { section: Section::Agents, name: "explore", hints: &["haiku", "flash", "grok", "mini", "fast"], wants_vision: false },
    RoleHint { section: Section::Agents, name: "frontend-ui-ux-engineer", hints: &["gemini", "sonnet"], wants_vision: false },
    RoleHint { section: Section::Agents, name: "document-writer", hints: &["gemini", "sonnet", "flash"], wants_vision: false },
    RoleHint { section: Section::Agents, name: "multimodal-looker", hints: &["gemini", "flash", "vision", "vl"], wants_vision: true },
    RoleHint { section: Section::Categories, name: "visual-engineering", hints: &["gemini", "sonnet"], wants_vision: false },
    RoleHint { section: Section::Categories, name: "ultrabrain", hints: &["gpt-5", "o3", "opus"], wants_vision: false },
    RoleHint { section: Section::Categories, name: "artistry", hints: &["gemini", "opus"], wants_vision: false },
    RoleHint { section: Section::Categories, name: "quick", hints: &["haiku", "flash", "mini", "fast"], wants_vision: false },
    RoleHint { section: Section::Categories, name: "most-capable", hints: &["opus", "gpt-5"], wants_vision: false },
    RoleHint { section: Section::Categories, name: "writing", hints: &["gemini", "sonnet"], wants_vision: false },
    RoleHint { section: Section::Categories, name: "general", hints: &["sonnet", "gpt", "gemini"], wants_vision: false },
];

/// agent/category 이름 → 합성 모델 식별자.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMapping {
    #[serde(default)]
    pub agents: BTreeMap<String, String>,
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
}

impl ModelMapping {
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.categories.is_empty()
    }

    fn section_mut(&mut self, section: Section) -> &mut BTreeMap<String, String> {
        match section {
            Section::Agents => &mut self.agents,
            Section::Categories => &mut self.categories,
        }
    }

    fn section(&self, section: Section) -> &BTreeMap<String, String> {
        match section {
            Section::Agents => &self.agents,
            Section::Categories => &self.categories,
        }
    }
}

fn supports_vision(spec: &Value) -> bool {
    if spec.get("attachment").and_then(Value::as_bool) == Some(true) {
        return true;
    }
    spec.pointer("/modalities/input")
        .and_then(Value::as_array)
        .is_some_and(|inputs| inputs.iter().any(|i| i.as_str() == Some("image")))
}

fn pick_model<'a>(role: &RoleHint, models: &'a JsonMap) -> Option<&'a str> {
    if role.wants_vision
        && let Some((id, _)) = models.iter().find(|(_, spec)| supports_vision(spec))
    {
        return Some(id.as_str());
    }

    for hint in role.hints {
        let found = models.iter().find(|(id, spec)| {
            let display = spec.get("name").and_then(Value::as_str).unwrap_or("");
            id.to_lowercase().contains(hint) || display.to_lowercase().contains(hint)
        });
        if let Some((id, _)) = found {
            return Some(id.as_str());
        }
    }
    None
}

/// 모델 이름/능력 힌트로 역할별 모델을 고른다. 하나도 고르지 못하면 `None`.
pub fn match_models_to_agents(provider_id: &str, models: &JsonMap) -> Option<ModelMapping> {
    let mut mapping = ModelMapping::default();
    for role in ROLE_HINTS {
        if let Some(model_id) = pick_model(role, models) {
            mapping
                .section_mut(role.section)
                .insert(role.name.to_string(), format!("{provider_id}/{model_id}"));
        }
    }
    (!mapping.is_empty()).then_some(mapping)
}

/// 매핑에 있는 역할의 `model`만 갱신한다. 나머지 역할은 손대지 않는다.
pub fn apply_model_mapping(behavior: &mut Value, mapping: &ModelMapping) {
    let root = coerce_object(behavior);
    for section in [Section::Agents, Section::Categories] {
        let entries = mapping.section(section);
        if entries.is_empty() {
            continue;
        }
        let target = child_object(root, section.key());
        for (name, model) in entries {
            child_object(target, name).insert("model".into(), Value::String(model.clone()));
        }
    }
}

fn entries_mut(behavior: &mut Value) -> impl Iterator<Item = &mut JsonMap> {
    let Value::Object(root) = behavior else {
        return Vec::new().into_iter();
    };
    let mut out = Vec::new();
    for (key, section) in root.iter_mut() {
        if key != Section::Agents.key() && key != Section::Categories.key() {
            continue;
        }
        if let Value::Object(entries) = section {
            out.extend(entries.values_mut().filter_map(Value::as_object_mut));
        }
    }
    out.into_iter()
}

fn rewrite_ref(value: &mut Value, old_prefix: &str, new_prefix: &str) -> bool {
    let Some(current) = value.as_str() else {
        return false;
    };
    let Some(rest) = current.strip_prefix(old_prefix) else {
        return false;
    };
    *value = Value::String(format!("{new_prefix}{rest}"));
    true
}

/// 합성 모델 식별자 필드(`model`, `fallback_models`)만 골라 provider 접두사를 바꾼다.
/// 프롬프트 등 자유 텍스트는 건드리지 않는다.
pub fn rewrite_provider_refs(
    behavior: &mut Value,
    old_provider: &str,
    new_provider: &str,
) -> usize {
    let old_prefix = format!("{old_provider}/");
    let new_prefix = format!("{new_provider}/");
    let mut rewritten = 0;

    for entry in entries_mut(behavior) {
        if let Some(model) = entry.get_mut("model")
            && rewrite_ref(model, &old_prefix, &new_prefix)
        {
            rewritten += 1;
        }
        if let Some(Value::Array(fallbacks)) = entry.get_mut("fallback_models") {
            for item in fallbacks.iter_mut() {
                if rewrite_ref(item, &old_prefix, &new_prefix) {
                    rewritten += 1;
                }
            }
        }
    }
    rewritten
}

/// 특정 provider만 가리키던 참조를 제거한다. 다른 provider 참조는 유지된다.
pub fn remove_provider_refs(behavior: &mut Value, provider: &str) -> usize {
    let prefix = format!("{provider}/");
    let points_at = |v: &Value| v.as_str().is_some_and(|s| s.starts_with(&prefix));
    let mut removed = 0;

    for entry in entries_mut(behavior) {
        if entry.get("model").is_some_and(points_at) {
            remove_key(entry, "model");
            removed += 1;
        }
        if let Some(Value::Array(fallbacks)) = entry.get_mut("fallback_models") {
            let before = fallbacks.len();
            fallbacks.retain(|v| !points_at(v));
            removed += before - fallbacks.len();
        }
    }
    removed
}
