//! 최초 설정 유스케이스: 기존 파일 보존 → 템플릿 설치 → 자격 증명/provider 시드.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::application::config::ConfigLayout;
use crate::application::ports::{BackupStore, Clock, DocumentStore};
use crate::application::usecases::reconcile_provider::{ReconcileProviderUseCase, ReconcileReport};
use crate::domain::backup::{ConfigType, backup_timestamp};
use crate::domain::document::{child_object, coerce_object, or_empty};
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::provider::ProviderRequest;

const AGENTS_TEMPLATE: &str = "AGENTS.md.template";
const CREDENTIALS_TEMPLATE: &str = "credentials.json.template";
/// AGENTS.md 템플릿에서 사용자 호칭으로 바뀌는 문자열
const NICKNAME_TOKEN: &str = "主人";
const DEFAULT_FC_ACCOUNT: &str = "default";
const DEFAULT_FC_REGION: &str = "cn-shanghai";

/// 설정 마법사 입력.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetupOptions {
    pub nickname: Option<String>,
    pub api_key: Option<String>,
    pub provider_name: Option<String>,
    #[serde(rename = "baseURL", alias = "baseUrl")]
    pub base_url: Option<String>,
    pub webhook: Option<WebhookOptions>,
    pub database: Option<DatabaseOptions>,
    pub deploy: Option<DeployOptions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookOptions {
    pub enabled: bool,
    pub platform: Option<String>,
    pub url: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub host: Option<String>,
    pub port: Option<Value>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeployOptions {
    pub fc: Option<FcOptions>,
    pub docker: Option<DockerOptions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FcOptions {
    pub enabled: bool,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DockerOptions {
    pub enabled: bool,
    pub registry: Option<String>,
    pub namespace: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetupOutcome {
    /// 기존 파일을 복사해 둔 디렉터리(없었으면 `None`)
    pub backup_dir: Option<PathBuf>,
    pub reconcile: Option<ReconcileReport>,
}

pub struct SetupUseCase<'a> {
    pub store: &'a dyn DocumentStore,
    pub backups: &'a dyn BackupStore,
    pub clock: &'a dyn Clock,
    pub layout: &'a ConfigLayout,
}

impl<'a> SetupUseCase<'a> {
    pub fn execute(&self, options: &SetupOptions) -> EngineResult<SetupOutcome> {
        let layout = self.layout;
        self.store.ensure_dir(&layout.root)?;

        // 템플릿으로 덮어쓰기 전에 사용자 파일을 그대로 복사해 둔다
        let timestamp = backup_timestamp(self.clock.now());
        let snapshot_dir = layout.setup_snapshot_dir(&timestamp);
        let backup_dir = self
            .backups
            .snapshot_if_exists(&layout.user_editable_files(), &snapshot_dir)?;
        if let Some(dir) = &backup_dir {
            tracing::info!(dir = %dir.display(), "existing config preserved before setup");
        }

        self.install_templates(options.nickname.as_deref())?;

        if let Some(api_key) = non_empty(options.api_key.as_deref()) {
            self.seed_api_key(api_key, options.provider_name.as_deref())?;
        }

        let provider_name = options.provider_name.as_deref();
        let base_url = options.base_url.as_deref();
        let reconcile = if ProviderRequest::new(provider_name, base_url).is_empty() {
            None
        } else {
            let reconciler = ReconcileProviderUseCase {
                store: self.store,
                layout,
            };
            Some(reconciler.execute(provider_name, base_url)?)
        };

        self.seed_credentials(options)?;

        tracing::info!("setup completed");
        Ok(SetupOutcome { backup_dir, reconcile })
    }

    fn install_templates(&self, nickname: Option<&str>) -> EngineResult<()> {
        let layout = self.layout;
        let templates_dir = layout
            .templates_dir
            .clone()
            .filter(|dir| self.store.exists(dir))
            .ok_or_else(|| {
                EngineError::MissingTemplate(layout.templates_dir.clone().unwrap_or_default())
            })?;

        let oh_template = templates_dir.join(ConfigType::Oh.target_file());
        let opencode_template = templates_dir.join(ConfigType::Opencode.target_file());
        for template in [&oh_template, &opencode_template] {
            if !self.store.exists(template) {
                return Err(EngineError::MissingTemplate(template.clone()));
            }
        }
        self.store.copy_file(&oh_template, &layout.behavior_registry_path())?;
        self.store.copy_file(&opencode_template, &layout.provider_registry_path())?;

        let credentials_template = templates_dir.join(CREDENTIALS_TEMPLATE);
        if !self.store.exists(&layout.credentials_path())
            && self.store.exists(&credentials_template)
        {
            self.store.copy_file(&credentials_template, &layout.credentials_path())?;
        }

        if let Some(template) = self.store.read_text(&templates_dir.join(AGENTS_TEMPLATE))? {
            let rendered = match non_empty(nickname) {
                Some(nickname) => template.replace(NICKNAME_TOKEN, nickname),
                None => template,
            };
            self.store.write_text(&layout.agents_md_path(), &rendered)?;
        }
        Ok(())
    }

    /// 모델 서비스 키를 자격 증명과 opencode 인증 파일에 함께 기록한다.
    fn seed_api_key(&self, api_key: &str, provider_name: Option<&str>) -> EngineResult<()> {
        self.edit_credentials(|root| {
            child_object(root, "model_service").insert("api_key".into(), json!(api_key));
        })?;

        let auth_path = self.layout.auth_path();
        let mut auth = match self.store.read_json(&auth_path) {
            Ok(doc) => or_empty(doc),
            Err(EngineError::MalformedDocument { .. }) => {
                tracing::warn!(path = %auth_path.display(), "auth file is malformed; rewriting");
                json!({})
            }
            Err(err) => return Err(err),
        };
        let provider_id = ProviderRequest::new(provider_name, None).provider_id();
        coerce_object(&mut auth).insert(provider_id, json!({"type": "api", "key": api_key}));
        self.store.write_json(&auth_path, &auth)
    }

    fn seed_credentials(&self, options: &SetupOptions) -> EngineResult<()> {
        if let Some(webhook) = &options.webhook
            && webhook.enabled
            && let Some(url) = non_empty(webhook.url.as_deref())
        {
            self.edit_credentials(|root| {
                root.insert(
                    "notification".into(),
                    json!({
                        "webhook": {
                            "enabled": true,
                            "platform": non_empty(webhook.platform.as_deref()).unwrap_or("feishu"),
                            "webhook_url": url,
                            "secret": webhook.secret.as_deref().unwrap_or(""),
                        }
                    }),
                );
            })?;
        }

        if let Some(database) = options.database.as_ref().filter(|db| db.enabled) {
            self.edit_credentials(|root| {
                child_object(root, "database").insert(
                    "default".into(),
                    json!({
                        "type": non_empty(database.kind.as_deref()).unwrap_or("mysql"),
                        "host": database.host,
                        "port": database.port,
                        "user": database.username,
                        "password": database.password,
                        "database": database.database,
                    }),
                );
            })?;
        }

        if let Some(deploy) = &options.deploy {
            self.edit_credentials(|root| {
                let section = child_object(root, "deploy");
                if let Some(fc) = deploy.fc.as_ref().filter(|fc| fc.enabled) {
                    let region = non_empty(fc.region.as_deref()).unwrap_or(DEFAULT_FC_REGION);
                    section.insert(
                        "aliyun_fc".into(),
                        json!({
                            "enabled": true,
                            "accounts": [{
                                "name": DEFAULT_FC_ACCOUNT,
                                "access_key_id": fc.access_key_id,
                                "access_key_secret": fc.access_key_secret,
                                "region": region,
                            }],
                            "default_account": DEFAULT_FC_ACCOUNT,
                        }),
                    );
                }
                if let Some(docker) = deploy.docker.as_ref().filter(|d| d.enabled) {
                    section.insert(
                        "docker".into(),
                        json!({
                            "enabled": true,
                            "registry": docker.registry,
                            "namespace": docker.namespace.as_deref().unwrap_or(""),
                            "username": docker.username,
                            "password": docker.password,
                        }),
                    );
                }
            })?;
        }
        Ok(())
    }

    fn edit_credentials<F>(&self, edit: F) -> EngineResult<()>
    where
        F: FnOnce(&mut serde_json::Map<String, Value>),
    {
        let path = self.layout.credentials_path();
        let mut credentials = or_empty(self.store.read_json(&path)?);
        edit(coerce_object(&mut credentials));
        self.store.write_json(&path, &credentials)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
