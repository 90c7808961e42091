//! JSON 문서 트리를 다루는 공용 헬퍼.

use serde_json::{Map, Value};

pub type JsonMap = Map<String, Value>;

/// 값이 객체가 아니면 빈 객체로 바꾼 뒤 가변 맵을 돌려준다.
pub fn coerce_object(value: &mut Value) -> &mut JsonMap {
    if !value.is_object() {
        *value = Value::Object(JsonMap::new());
    }
    let Value::Object(map) = value else {
        unreachable!("value coerced into an object above");
    };
    map
}

/// `map[key]`를 객체로 보장한다(없거나 객체가 아니면 `{}`로 교체).
pub fn child_object<'a>(map: &'a mut JsonMap, key: &str) -> &'a mut JsonMap {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(JsonMap::new()));
    coerce_object(slot)
}

/// 부재 문서를 빈 객체로 정규화한다.
pub fn or_empty(document: Option<Value>) -> Value {
    match document {
        Some(value @ Value::Object(_)) => value,
        _ => Value::Object(JsonMap::new()),
    }
}

/// 비어 있지 않은 문자열인지 확인한다.
pub fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
