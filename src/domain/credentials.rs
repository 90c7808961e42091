//! credentials.json 도메인별 마스킹 뷰/저장 규칙.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use crate::domain::document::{JsonMap, child_object, coerce_object};
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::secret::{
    mask_for_display, mask_list, mask_map, resolve_for_save, resolve_list, resolve_map,
};

pub const DEFAULT_SERVER_PORT: u16 = 4096;
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_IMAGE_GENERATOR_URL: &str = "http://localhost:7860";

/// 자격 증명 저장소의 도메인 키.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialDomain {
    Deploy,
    Database,
    Feishu,
    ImageGenerator,
    Notification,
    ModelService,
}

/// 도메인 레코드의 모양(식별 방식 포함).
enum Shape {
    /// 식별자 = 레코드의 이름 필드
    List { identity_key: &'static str },
    /// 식별자 = 맵 키
    Map,
    /// 단일 레코드(식별자 = 도메인 키)
    Record,
}

impl CredentialDomain {
    pub const ALL: [CredentialDomain; 6] = [
        CredentialDomain::Deploy,
        CredentialDomain::Database,
        CredentialDomain::Feishu,
        CredentialDomain::ImageGenerator,
        CredentialDomain::Notification,
        CredentialDomain::ModelService,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CredentialDomain::Deploy => "deploy",
            CredentialDomain::Database => "database",
            CredentialDomain::Feishu => "feishu",
            CredentialDomain::ImageGenerator => "image_generator",
            CredentialDomain::Notification => "notification",
            CredentialDomain::ModelService => "model_service",
        }
    }

    /// 마스킹 대상 필드 이름.
    pub fn secret_fields(self) -> &'static [&'static str] {
        match self {
            CredentialDomain::Deploy => &["access_key_secret"],
            CredentialDomain::Database => &["password"],
            CredentialDomain::Feishu => &["app_secret"],
            CredentialDomain::ImageGenerator => &["api_key"],
            CredentialDomain::Notification => &["secret"],
            CredentialDomain::ModelService => &["api_key"],
        }
    }

    fn shape(self) -> Shape {
        match self {
            CredentialDomain::Deploy => Shape::List {
                identity_key: "name",
            },
            CredentialDomain::Database => Shape::Map,
            _ => Shape::Record,
        }
    }
}

impl fmt::Display for CredentialDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CredentialDomain {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        CredentialDomain::ALL
            .into_iter()
            .find(|d| d.key() == normalized)
            .ok_or_else(|| EngineError::InvalidInput(format!("unknown credential domain: {s}")))
    }
}

/// 손으로 고친 파일의 `null`, 숫자 문자열 등은 기본값으로 채워 읽는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeishuRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    app_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    app_secret: String,
    #[serde(default, deserialize_with = "lenient_string")]
    working_dir: String,
    #[serde(default = "default_server_host", deserialize_with = "lenient_server_host")]
    server_host: String,
    #[serde(default = "default_server_port", deserialize_with = "lenient_server_port")]
    server_port: u16,
    #[serde(default = "default_true", deserialize_with = "unless_false")]
    use_server_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ImageGeneratorRecord {
    #[serde(default = "default_true", deserialize_with = "unless_false")]
    enabled: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    api_key: String,
    #[serde(default = "default_image_generator_url", deserialize_with = "lenient_string")]
    base_url: String,
}

fn default_server_host() -> String {
    DEFAULT_SERVER_HOST.to_string()
}

fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn default_true() -> bool {
    true
}

fn default_image_generator_url() -> String {
    DEFAULT_IMAGE_GENERATOR_URL.to_string()
}

/// 문자열은 그대로, 숫자는 문자열로, 나머지(`null` 포함)는 빈 문자열.
fn lenient_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_server_host<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    let host = lenient_string(de)?;
    Ok(if host.trim().is_empty() {
        default_server_host()
    } else {
        host
    })
}

/// 숫자 또는 숫자 문자열. 0이나 범위 밖 값은 기본 포트.
fn lenient_server_port<'de, D: Deserializer<'de>>(de: D) -> Result<u16, D::Error> {
    let port = match Value::deserialize(de)? {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    Ok(port.filter(|p| *p != 0).unwrap_or(DEFAULT_SERVER_PORT))
}

/// 명시적인 `false`만 끈다.
fn unless_false<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(!matches!(Value::deserialize(de)?, Value::Bool(false)))
}

/// 저장소에서 도메인 원본 레코드를 꺼낸다(표시 형태로 정규화).
fn stored_view(store: &Value, domain: CredentialDomain) -> EngineResult<Value> {
    let view = match domain {
        CredentialDomain::Deploy => {
            let fc = store.pointer("/deploy/aliyun_fc");
            let accounts = fc
                .and_then(|v| v.get("accounts"))
                .cloned()
                .filter(Value::is_array)
                .unwrap_or_else(|| json!([]));
            let default_account = fc
                .and_then(|v| v.get("default_account"))
                .and_then(Value::as_str)
                .unwrap_or("");
            json!({
                "accounts": accounts,
                "default_account": default_account,
            })
        }
        CredentialDomain::Database => {
            let connections = store
                .get("database")
                .cloned()
                .filter(Value::is_object)
                .unwrap_or_else(|| json!({}));
            json!({ "connections": connections })
        }
        CredentialDomain::Feishu => {
            let raw = store.get("feishu").cloned().unwrap_or_else(|| json!({}));
            to_value(&parse_record::<FeishuRecord>(raw)?)?
        }
        CredentialDomain::ImageGenerator => store
            .get("image_generator")
            .cloned()
            .unwrap_or_else(|| json!({"enabled": false})),
        CredentialDomain::Notification => store
            .pointer("/notification/webhook")
            .cloned()
            .unwrap_or_else(|| json!({"enabled": false})),
        CredentialDomain::ModelService => store
            .get("model_service")
            .cloned()
            .unwrap_or_else(|| json!({})),
    };
    Ok(view)
}

/// 비밀 필드를 가린 도메인 뷰를 만든다.
pub fn masked_view(store: &Value, domain: CredentialDomain) -> EngineResult<Value> {
    let mut view = stored_view(store, domain)?;
    let fields = domain.secret_fields();
    match domain.shape() {
        Shape::List { .. } => {
            let masked = view
                .get("accounts")
                .and_then(Value::as_array)
                .map(|records| mask_list(records, fields))
                .unwrap_or_default();
            coerce_object(&mut view).insert("accounts".into(), Value::Array(masked));
        }
        Shape::Map => {
            let masked = view
                .get("connections")
                .and_then(Value::as_object)
                .map(|records| mask_map(records, fields))
                .unwrap_or_default();
            coerce_object(&mut view).insert("connections".into(), Value::Object(masked));
        }
        Shape::Record => view = mask_for_display(&view, fields),
    }
    Ok(view)
}

/// 편집된 뷰를 저장소에 반영한다. 플레이스홀더는 기존 비밀값으로 복원된다.
pub fn apply_save(
    store: &mut Value,
    domain: CredentialDomain,
    incoming: Value,
) -> EngineResult<()> {
    if !incoming.is_object() {
        return Err(EngineError::InvalidInput(format!(
            "{domain} payload must be a JSON object"
        )));
    }
    let existing = stored_view(store, domain)?;
    let fields = domain.secret_fields();

    match domain.shape() {
        Shape::List { identity_key } => {
            let incoming_accounts = array_field(&incoming, "accounts");
            let existing_accounts = array_field(&existing, "accounts");
            let accounts =
                resolve_list(&incoming_accounts, fields, identity_key, &existing_accounts);
            let default_account = incoming
                .get("default_account")
                .and_then(Value::as_str)
                .unwrap_or("");

            let deploy = child_object(coerce_object(store), "deploy");
            deploy.insert(
                "aliyun_fc".into(),
                json!({
                    "enabled": true,
                    "accounts": accounts,
                    "default_account": default_account,
                }),
            );
        }
        Shape::Map => {
            let incoming_connections = object_field(&incoming, "connections");
            let existing_connections = object_field(&existing, "connections");
            let connections = resolve_map(&incoming_connections, fields, &existing_connections);
            coerce_object(store).insert("database".into(), Value::Object(connections));
        }
        Shape::Record => {
            let mut by_identity = JsonMap::new();
            by_identity.insert(domain.key().to_string(), existing);
            let resolved = resolve_for_save(&incoming, fields, Some(domain.key()), &by_identity);
            let record = normalize_record(domain, resolved)?;
            let root = coerce_object(store);
            match domain {
                CredentialDomain::Notification => {
                    child_object(root, "notification").insert("webhook".into(), record);
                }
                _ => {
                    root.insert(domain.key().to_string(), record);
                }
            }
        }
    }
    Ok(())
}

fn normalize_record(domain: CredentialDomain, record: Value) -> EngineResult<Value> {
    match domain {
        CredentialDomain::Feishu => to_value(&parse_record::<FeishuRecord>(record)?),
        CredentialDomain::ImageGenerator => {
            let mut parsed = parse_record::<ImageGeneratorRecord>(record)?;
            parsed.enabled = true;
            if parsed.base_url.trim().is_empty() {
                parsed.base_url = default_image_generator_url();
            }
            to_value(&parsed)
        }
        CredentialDomain::Notification => {
            let mut record = record;
            let map = coerce_object(&mut record);
            if !map.get("platform").is_some_and(Value::is_string) {
                map.insert("platform".into(), json!("feishu"));
            }
            Ok(record)
        }
        _ => Ok(record),
    }
}

fn parse_record<T: for<'de> Deserialize<'de>>(raw: Value) -> EngineResult<T> {
    serde_json::from_value(raw).map_err(|e| EngineError::InvalidInput(e.to_string()))
}

fn to_value<T: Serialize>(record: &T) -> EngineResult<Value> {
    serde_json::to_value(record).map_err(|e| EngineError::InvalidInput(e.to_string()))
}

fn array_field(value: &Value, key: &str) -> Vec<Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn object_field(value: &Value, key: &str) -> JsonMap {
    value
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}
