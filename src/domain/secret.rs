//! 민감 필드 마스킹/복원 규칙.
//!
//! 화면에는 고정 플레이스홀더만 내보내고, 저장 시 플레이스홀더가 그대로 돌아오면
//! 식별 키로 찾은 기존 값을 되살린다.

use serde_json::Value;

use crate::domain::document::JsonMap;

/// 표시용 고정 플레이스홀더.
pub const MASK_PLACEHOLDER: &str = "••••••••";

pub fn is_placeholder(value: &Value) -> bool {
    value.as_str() == Some(MASK_PLACEHOLDER)
}

fn has_secret(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Bool(b) => *b,
        _ => true,
    }
}

/// 지정 필드 중 값이 있는 것만 플레이스홀더로 바꾼다.
/// 빈 값은 `""`로 보이고, 없는 필드는 추가하지 않는다.
pub fn mask_for_display(record: &Value, fields: &[&str]) -> Value {
    let mut out = record.clone();
    if let Value::Object(map) = &mut out {
        for field in fields {
            if let Some(slot) = map.get_mut(*field) {
                *slot = if has_secret(slot) {
                    Value::String(MASK_PLACEHOLDER.to_string())
                } else if slot.is_null() {
                    Value::Null
                } else {
                    Value::String(String::new())
                };
            }
        }
    }
    out
}

/// 플레이스홀더로 돌아온 필드를 `existing_by_identity[identity][field]`로 복원한다.
/// 기존 값을 찾지 못하면 플레이스홀더를 그대로 둔다(비밀값을 지어내지 않음).
pub fn resolve_for_save(
    incoming: &Value,
    fields: &[&str],
    identity: Option<&str>,
    existing_by_identity: &JsonMap,
) -> Value {
    let mut out = incoming.clone();
    let Value::Object(map) = &mut out else {
        return out;
    };

    let existing = identity.and_then(|id| existing_by_identity.get(id));
    for field in fields {
        let Some(slot) = map.get_mut(*field) else {
            continue;
        };
        if !is_placeholder(slot) {
            continue;
        }
        match existing.and_then(|record| record.get(*field)) {
            Some(prior) if has_secret(prior) => *slot = prior.clone(),
            _ => {
                tracing::warn!(
                    field = *field,
                    identity = identity.unwrap_or("-"),
                    "placeholder without stored secret; kept literal"
                );
            }
        }
    }
    out
}

/// 목록형 레코드를 식별 필드 기준 맵으로 색인한다.
pub fn index_by_field(records: &[Value], identity_key: &str) -> JsonMap {
    let mut out = JsonMap::new();
    for record in records {
        if let Some(id) = record.get(identity_key).and_then(Value::as_str)
            && !id.is_empty()
        {
            out.insert(id.to_string(), record.clone());
        }
    }
    out
}

pub fn mask_list(records: &[Value], fields: &[&str]) -> Vec<Value> {
    records
        .iter()
        .map(|record| mask_for_display(record, fields))
        .collect()
}

/// 목록형 도메인: 식별자는 각 레코드의 `identity_key` 필드.
pub fn resolve_list(
    incoming: &[Value],
    fields: &[&str],
    identity_key: &str,
    existing: &[Value],
) -> Vec<Value> {
    let by_identity = index_by_field(existing, identity_key);
    incoming
        .iter()
        .map(|record| {
            let identity = record.get(identity_key).and_then(Value::as_str);
            resolve_for_save(record, fields, identity, &by_identity)
        })
        .collect()
}

pub fn mask_map(records: &JsonMap, fields: &[&str]) -> JsonMap {
    records
        .iter()
        .map(|(key, record)| (key.clone(), mask_for_display(record, fields)))
        .collect()
}

/// 맵형 도메인: 식별자는 맵 키 자체.
pub fn resolve_map(incoming: &JsonMap, fields: &[&str], existing: &JsonMap) -> JsonMap {
    incoming
        .iter()
        .map(|(key, record)| {
            (
                key.clone(),
                resolve_for_save(record, fields, Some(key), existing),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_only_present_non_empty_fields() {
        let record = json!({"name": "prod", "access_key_secret": "s3cr3t", "password": ""});
        let masked = mask_for_display(&record, &["access_key_secret", "password", "token"]);
        assert_eq!(
            masked,
            json!({"name": "prod", "access_key_secret": MASK_PLACEHOLDER, "password": ""})
        );
    }

    #[test]
    fn list_round_trip_restores_secrets() {
        let stored = vec![
            json!({"name": "prod", "access_key_id": "AK1", "access_key_secret": "one"}),
            json!({"name": "dev", "access_key_id": "AK2", "access_key_secret": ""}),
        ];
        let masked = mask_list(&stored, &["access_key_secret"]);
        let saved = resolve_list(&masked, &["access_key_secret"], "name", &stored);
        assert_eq!(saved, stored);
    }

    #[test]
    fn unknown_identity_keeps_literal_placeholder_and_leaves_others() {
        let stored = vec![json!({"name": "prod", "access_key_secret": "one"})];
        let incoming = vec![
            json!({"name": "prod", "access_key_secret": MASK_PLACEHOLDER}),
            json!({"name": "new", "access_key_secret": MASK_PLACEHOLDER}),
        ];
        let saved = resolve_list(&incoming, &["access_key_secret"], "name", &stored);
        assert_eq!(saved[0]["access_key_secret"], "one");
        assert_eq!(saved[1]["access_key_secret"], MASK_PLACEHOLDER);
    }

    #[test]
    fn explicit_values_are_stored_verbatim() {
        let mut existing = JsonMap::new();
        existing.insert("default".into(), json!({"password": "old"}));
        let mut incoming = JsonMap::new();
        incoming.insert("default".into(), json!({"password": ""}));
        incoming.insert("other".into(), json!({"password": "fresh"}));

        let saved = resolve_map(&incoming, &["password"], &existing);
        assert_eq!(saved["default"]["password"], "");
        assert_eq!(saved["other"]["password"], "fresh");
    }
}
