//! 호스팅 서비스 모델 목록 조회 포트 구현 어댑터.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::application::ports::ModelCatalog;

/// `<baseUrl>/models` 를 Bearer 키로 조회하는 어댑터.
pub struct HttpModelCatalog;

#[async_trait]
impl ModelCatalog for HttpModelCatalog {
    async fn fetch_models(
        &self,
        base_url: &str,
        api_key: &str,
        timeout_ms: u64,
    ) -> Result<Vec<Value>> {
        let endpoint = models_endpoint(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        let resp = client
            .get(endpoint.clone())
            .header("Authorization", format!("Bearer {api_key}"))
            .send()
            .await
            .with_context(|| format!("failed to request {endpoint}"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("model list request to {endpoint} returned {status}");
        }

        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse model list from {endpoint}"))?;
        parse_model_list(body).with_context(|| format!("unexpected model list from {endpoint}"))
    }
}

/// base URL 뒤에 `models` 경로를 붙인다(끝 `/` 유무와 무관).
fn models_endpoint(base_url: &str) -> Result<Url> {
    let normalized = format!("{}/", base_url.trim().trim_end_matches('/'));
    let base =
        Url::parse(&normalized).with_context(|| format!("invalid hosted base URL: {base_url}"))?;
    Ok(base.join("models")?)
}

/// OpenAI 호환 `{data: [...]}` 또는 최상위 배열을 허용한다.
/// 목록이 없는 응답(오류 본문 등)은 빈 목록이 아니라 실패로 돌려준다.
fn parse_model_list(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => bail!("response has no `data` array"),
        },
        other => bail!("response is not a model list: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_joins_models_path() {
        assert_eq!(
            models_endpoint("https://api.example.com/v1").unwrap().as_str(),
            "https://api.example.com/v1/models"
        );
        assert_eq!(
            models_endpoint("https://api.example.com/v1/").unwrap().as_str(),
            "https://api.example.com/v1/models"
        );
    }

    #[test]
    fn accepts_data_envelope_or_bare_array() {
        let enveloped = parse_model_list(json!({"data": [{"id": "a"}]})).unwrap();
        assert_eq!(enveloped, vec![json!({"id": "a"})]);
        assert_eq!(parse_model_list(json!(["b"])).unwrap(), vec![json!("b")]);
        assert!(parse_model_list(json!({"data": []})).unwrap().is_empty());
    }

    #[test]
    fn body_without_list_is_an_error() {
        assert!(parse_model_list(json!({"error": "quota exceeded"})).is_err());
        assert!(parse_model_list(json!({"data": null})).is_err());
        assert!(parse_model_list(json!("ok")).is_err());
    }
}
