//! 실행 요청을 유스케이스로 보내고 JSON 응답 봉투로 감싼다.

use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::error::EngineError;
use crate::interface::cli::CliAction;
use crate::interface::composition::AppComposition;

/// 엔진 밖 오류(설정 로딩 등)에 붙는 종류.
const SETTINGS_ERROR_KIND: &str = "SettingsError";

/// `{"success": true, "data": ...}` 또는 `{"success": false, "kind": ..., "error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DispatchResponse {
    Success { success: bool, data: Value },
    Failure { success: bool, kind: String, error: String },
}

impl DispatchResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => DispatchResponse::Success { success: true, data },
            Err(err) => DispatchResponse::failure(SETTINGS_ERROR_KIND, err.to_string()),
        }
    }

    pub fn failure(kind: &str, error: impl Into<String>) -> Self {
        DispatchResponse::Failure {
            success: false,
            kind: kind.to_string(),
            error: error.into(),
        }
    }

    /// 엔진 오류는 종류와 메시지를 그대로 싣는다.
    pub fn from_result<T: Serialize>(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(data) => DispatchResponse::success(data),
            Err(err) => match err.downcast_ref::<EngineError>() {
                Some(engine) => DispatchResponse::failure(engine.kind().code(), engine.to_string()),
                None => DispatchResponse::failure(SETTINGS_ERROR_KIND, format!("{err:#}")),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DispatchResponse::Success { .. })
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            json!({
                "success": false,
                "kind": SETTINGS_ERROR_KIND,
                "error": "unserializable response"
            })
            .to_string()
        })
    }
}

/// 요청 하나를 실행한다.
pub async fn dispatch(composition: &AppComposition, action: CliAction) -> DispatchResponse {
    match action {
        CliAction::ShowCredentials(domain) => {
            respond(composition.get_masked_credential_view(domain))
        }
        CliAction::SaveCredentials(domain, record) => respond(
            composition
                .save_credential_view(domain, record)
                .map(|()| json!({"saved": domain.key()})),
        ),
        CliAction::ReconcileProvider { name, base_url } => {
            respond(composition.reconcile_provider(name.as_deref(), base_url.as_deref()))
        }
        CliAction::ApplyHosted {
            api_key,
            plan,
            offline,
        } => {
            let result = if offline {
                composition.apply_hosted_config(&api_key, plan.as_deref(), None)
            } else {
                composition
                    .apply_hosted_config_online(&api_key, plan.as_deref())
                    .await
            };
            respond(result)
        }
        CliAction::RemoveHosted => respond(composition.remove_hosted_config()),
        CliAction::HostedStatus => respond(composition.hosted_usecase().status()),
        CliAction::SetHostedBaseUrl(url) => {
            respond(composition.hosted_usecase().set_base_url(&url))
        }
        CliAction::ListBackups(config_type) => respond(composition.list_backups(config_type)),
        CliAction::CreateBackup(config_type) => respond(composition.create_backup(config_type)),
        CliAction::RestoreBackup(name) => respond(composition.restore_backup(&name)),
        CliAction::Setup(options) => respond(composition.setup_config(&options)),
        CliAction::ListModels => respond(composition.models_usecase().list_available()),
        CliAction::AssignModels(mapping) => {
            respond(composition.models_usecase().save_agent_models(&mapping))
        }
        CliAction::ShowCompaction => respond(composition.models_usecase().compaction_model()),
        CliAction::SetCompaction(model) => respond(
            composition
                .models_usecase()
                .save_compaction_model(model.as_deref()),
        ),
        CliAction::InspectSettings => DispatchResponse::from_result(
            composition
                .inspect_settings_usecase()
                .execute()
                .and_then(|raw| Ok(serde_json::from_str::<Value>(&raw)?)),
        ),
    }
}

fn respond<T: Serialize>(result: Result<T, EngineError>) -> DispatchResponse {
    DispatchResponse::from_result(result.map_err(anyhow::Error::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let rendered = serde_json::to_value(DispatchResponse::success(json!({"a": 1}))).unwrap();
        assert_eq!(rendered, json!({"success": true, "data": {"a": 1}}));
    }

    #[test]
    fn engine_error_keeps_kind_and_message() {
        let response = respond::<()>(Err(EngineError::BackupNotFound("oh-x.json".into())));
        assert!(!response.is_success());
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({
                "success": false,
                "kind": "BackupNotFound",
                "error": "Backup not found: oh-x.json"
            })
        );
    }

    #[test]
    fn other_errors_use_settings_kind() {
        let response = DispatchResponse::from_result::<()>(Err(anyhow::anyhow!("boom")));
        assert!(matches!(
            response,
            DispatchResponse::Failure { ref kind, .. } if kind == "SettingsError"
        ));
    }
}
