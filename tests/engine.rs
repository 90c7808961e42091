//! 임시 설정 루트 위에서 엔진 진입점을 끝까지 실행하는 통합 테스트.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};
use tempfile::TempDir;

use omoconf::application::ports::{Clock, DocumentStore, ModelCatalog};
use omoconf::application::usecases::hosted_config::HostedConfigUseCase;
use omoconf::application::usecases::reconcile_provider::ReconcileProviderUseCase;
use omoconf::application::usecases::setup::SetupOptions;
use omoconf::domain::backup::ConfigType;
use omoconf::domain::credentials::CredentialDomain;
use omoconf::domain::model_mapping::ModelMapping;
use omoconf::domain::secret::MASK_PLACEHOLDER;
use omoconf::infrastructure::adapters::FsDocumentStore;
use omoconf::{AppComposition, ConfigLayout, EngineError, EngineResult};

/// 호출할 때마다 1초씩 앞으로 가는 시계.
struct SteppingClock {
    base: DateTime<Utc>,
    ticks: AtomicI64,
}

impl SteppingClock {
    fn boxed() -> Box<Self> {
        Box::new(Self {
            base: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            ticks: AtomicI64::new(0),
        })
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + Duration::seconds(self.ticks.fetch_add(1, Ordering::SeqCst))
    }
}

struct FixedCatalog {
    models: Vec<Value>,
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ModelCatalog for FixedCatalog {
    async fn fetch_models(
        &self,
        base_url: &str,
        api_key: &str,
        _timeout_ms: u64,
    ) -> Result<Vec<Value>> {
        self.calls
            .lock()
            .unwrap()
            .push((base_url.to_string(), api_key.to_string()));
        Ok(self.models.clone())
    }
}

struct FailingCatalog;

#[async_trait]
impl ModelCatalog for FailingCatalog {
    async fn fetch_models(
        &self,
        _base_url: &str,
        _api_key: &str,
        _timeout_ms: u64,
    ) -> Result<Vec<Value>> {
        bail!("connection refused")
    }
}

/// 지정한 경로에 대한 JSON 기록만 실패하는 문서 저장소.
struct FailingWriteStore {
    inner: FsDocumentStore,
    fail_on: PathBuf,
}

impl DocumentStore for FailingWriteStore {
    fn ensure_dir(&self, path: &Path) -> EngineResult<()> {
        self.inner.ensure_dir(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn read_json(&self, path: &Path) -> EngineResult<Option<Value>> {
        self.inner.read_json(path)
    }

    fn write_json(&self, path: &Path, document: &Value) -> EngineResult<()> {
        if path == self.fail_on {
            return Err(EngineError::io(path, io::Error::other("disk full")));
        }
        self.inner.write_json(path, document)
    }

    fn read_text(&self, path: &Path) -> EngineResult<Option<String>> {
        self.inner.read_text(path)
    }

    fn write_text(&self, path: &Path, content: &str) -> EngineResult<()> {
        self.inner.write_text(path, content)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> EngineResult<()> {
        self.inner.copy_file(src, dst)
    }

    fn remove_file(&self, path: &Path) -> EngineResult<()> {
        self.inner.remove_file(path)
    }
}

fn engine(dir: &TempDir) -> AppComposition {
    let layout = ConfigLayout::new(dir.path().join("opencode"))
        .with_auth_dir(dir.path().join("auth"))
        .with_templates_dir(dir.path().join("templates"));
    AppComposition::with_layout(layout).with_clock(SteppingClock::boxed())
}

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap() + "\n").unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn seed_registries(engine: &AppComposition) {
    write_json(
        &engine.layout().provider_registry_path(),
        &json!({
            "$schema": "https://opencode.ai/config.json",
            "provider": {
                "unified-proxy": {
                    "npm": "@ai-sdk/openai-compatible",
                    "name": "统一代理服务",
                    "options": {"baseURL": "https://old.example/v1"},
                    "models": {"gpt": {"name": "GPT"}}
                }
            }
        }),
    );
    write_json(
        &engine.layout().behavior_registry_path(),
        &json!({
            "agents": {
                "sisyphus": {"model": "unified-proxy/gpt"},
                "custom-helper": {
                    "model": "unified-proxy/gpt",
                    "fallback_models": ["unified-proxy/gpt", "other/model"],
                    "prompt_append": "mention unified-proxy/gpt verbatim"
                }
            },
            "categories": {"quick": {"model": "unified-proxy/gpt"}}
        }),
    );
}

#[test]
fn masked_view_saved_back_unchanged_keeps_secrets() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    let stored = json!({
        "deploy": {
            "aliyun_fc": {
                "enabled": true,
                "accounts": [
                    {"name": "prod", "access_key_id": "AK1", "access_key_secret": "s3cret"},
                    {"name": "dev", "access_key_id": "AK2", "access_key_secret": ""}
                ],
                "default_account": "prod"
            },
            "docker": {"enabled": true, "registry": "r.example"}
        },
        "model_service": {"api_key": "sk-live"}
    });
    write_json(&engine.layout().credentials_path(), &stored);

    let view = engine.get_masked_credential_view(CredentialDomain::Deploy).unwrap();
    assert_eq!(view["accounts"][0]["access_key_secret"], MASK_PLACEHOLDER);
    assert_eq!(view["accounts"][1]["access_key_secret"], "");
    assert!(!view.to_string().contains("s3cret"));

    engine.save_credential_view(CredentialDomain::Deploy, view).unwrap();
    let service = engine.get_masked_credential_view(CredentialDomain::ModelService).unwrap();
    engine.save_credential_view(CredentialDomain::ModelService, service).unwrap();

    assert_eq!(read_json(&engine.layout().credentials_path()), stored);
}

#[test]
fn placeholder_for_unknown_account_does_not_touch_others() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    write_json(
        &engine.layout().credentials_path(),
        &json!({
            "deploy": {"aliyun_fc": {"accounts": [{"name": "prod", "access_key_secret": "s1"}]}}
        }),
    );

    engine
        .save_credential_view(
            CredentialDomain::Deploy,
            json!({
                "accounts": [
                    {"name": "prod", "access_key_secret": MASK_PLACEHOLDER},
                    {"name": "new", "access_key_secret": MASK_PLACEHOLDER}
                ],
                "default_account": "prod"
            }),
        )
        .unwrap();

    let saved = read_json(&engine.layout().credentials_path());
    let accounts = &saved["deploy"]["aliyun_fc"]["accounts"];
    assert_eq!(accounts[0]["access_key_secret"], "s1");
    assert_eq!(accounts[1]["access_key_secret"], MASK_PLACEHOLDER);
}

#[test]
fn explicit_empty_secret_is_stored_verbatim() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    write_json(
        &engine.layout().credentials_path(),
        &json!({"database": {"main": {"host": "db", "password": "pw"}}}),
    );

    engine
        .save_credential_view(
            CredentialDomain::Database,
            json!({"connections": {"main": {"host": "db2", "password": ""}}}),
        )
        .unwrap();

    let saved = read_json(&engine.layout().credentials_path());
    assert_eq!(saved["database"]["main"], json!({"host": "db2", "password": ""}));
}

#[test]
fn provider_rename_moves_entry_and_rewrites_references() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    seed_registries(&engine);

    let report = engine
        .reconcile_provider(Some("Acme"), Some(" https://acme.example/v1/ "))
        .unwrap();
    assert!(report.moved);
    assert_eq!(report.provider_id, "acme");
    assert!(report.provider_registry_written && report.behavior_registry_written);

    let registry = read_json(&engine.layout().provider_registry_path());
    let providers = registry["provider"].as_object().unwrap();
    assert!(!providers.contains_key("unified-proxy"));
    assert_eq!(providers["acme"]["name"], "Acme");
    assert_eq!(providers["acme"]["options"]["baseURL"], "https://acme.example/v1");
    assert_eq!(providers["acme"]["npm"], "@ai-sdk/openai-compatible");

    let behavior = read_json(&engine.layout().behavior_registry_path());
    assert_eq!(behavior["agents"]["sisyphus"]["model"], "acme/gpt");
    assert_eq!(behavior["agents"]["custom-helper"]["model"], "acme/gpt");
    assert_eq!(
        behavior["agents"]["custom-helper"]["fallback_models"],
        json!(["acme/gpt", "other/model"])
    );
    assert_eq!(behavior["categories"]["quick"]["model"], "acme/gpt");
    // 자유 텍스트는 건드리지 않는다
    assert_eq!(
        behavior["agents"]["custom-helper"]["prompt_append"],
        "mention unified-proxy/gpt verbatim"
    );
}

#[test]
fn reconcile_twice_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    seed_registries(&engine);

    engine.reconcile_provider(Some("Acme Cloud"), Some("https://acme.example")).unwrap();
    let registry_after_first = fs::read(engine.layout().provider_registry_path()).unwrap();
    let behavior_after_first = fs::read(engine.layout().behavior_registry_path()).unwrap();

    let second = engine
        .reconcile_provider(Some("Acme Cloud"), Some("https://acme.example"))
        .unwrap();
    assert_eq!(second.provider_id, "acme-cloud");
    assert!(!second.moved);
    assert!(!second.provider_registry_written);
    assert!(!second.behavior_registry_written);
    assert_eq!(fs::read(engine.layout().provider_registry_path()).unwrap(), registry_after_first);
    assert_eq!(fs::read(engine.layout().behavior_registry_path()).unwrap(), behavior_after_first);
}

#[test]
fn reconcile_without_name_or_url_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    seed_registries(&engine);
    let before = fs::read(engine.layout().provider_registry_path()).unwrap();

    let report = engine.reconcile_provider(None, Some("  / ")).unwrap();
    assert!(report.skipped);
    assert_eq!(fs::read(engine.layout().provider_registry_path()).unwrap(), before);
}

#[test]
fn rename_onto_existing_provider_keeps_existing_entry() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    write_json(
        &engine.layout().provider_registry_path(),
        &json!({"provider": {
            "unified-proxy": {"models": {}},
            "acme": {"name": "Acme", "models": {}}
        }}),
    );

    let report = engine.reconcile_provider(Some("acme"), None).unwrap();
    assert!(!report.moved);
    let registry = read_json(&engine.layout().provider_registry_path());
    assert!(registry["provider"].get("unified-proxy").is_some());
    assert_eq!(registry["provider"]["acme"]["name"], "acme");
}

#[test]
fn malformed_registry_aborts_without_writing() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    seed_registries(&engine);
    fs::write(engine.layout().behavior_registry_path(), "{ broken").unwrap();
    let before = fs::read(engine.layout().provider_registry_path()).unwrap();

    let err = engine.reconcile_provider(Some("acme"), None).unwrap_err();
    assert!(matches!(err, EngineError::MalformedDocument { .. }));
    assert_eq!(fs::read(engine.layout().provider_registry_path()).unwrap(), before);
}

#[test]
fn rename_keeps_the_provider_model_set() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    write_json(
        &engine.layout().provider_registry_path(),
        &json!({"provider": {"unified-proxy": {"models": {"gpt": {}, "fast": {}}}}}),
    );
    write_json(
        &engine.layout().behavior_registry_path(),
        &json!({"agents": {"sisyphus": {"model": "unified-proxy/gpt"}}}),
    );

    engine.reconcile_provider(Some("Acme"), None).unwrap();

    let registry = read_json(&engine.layout().provider_registry_path());
    let models: Vec<&String> = registry["provider"]["acme"]["models"]
        .as_object()
        .unwrap()
        .keys()
        .collect();
    assert_eq!(models, ["gpt", "fast"]);
    assert!(registry["provider"].get("unified-proxy").is_none());
    let behavior = read_json(&engine.layout().behavior_registry_path());
    assert!(!behavior.to_string().contains("unified-proxy/"));
}

#[test]
fn behavior_write_failure_rolls_back_provider_registry() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    seed_registries(&engine);
    let registry_before = read_json(&engine.layout().provider_registry_path());
    let behavior_before = read_json(&engine.layout().behavior_registry_path());

    let store = FailingWriteStore {
        inner: FsDocumentStore,
        fail_on: engine.layout().behavior_registry_path(),
    };
    let usecase = ReconcileProviderUseCase {
        store: &store,
        layout: engine.layout(),
    };
    let err = usecase.execute(Some("Acme"), Some("https://acme.example")).unwrap_err();

    assert!(matches!(err, EngineError::Io { .. }));
    assert_eq!(read_json(&engine.layout().provider_registry_path()), registry_before);
    assert_eq!(read_json(&engine.layout().behavior_registry_path()), behavior_before);
}

#[test]
fn hosted_apply_then_remove_clears_slot() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    seed_registries(&engine);
    write_json(
        &engine.layout().hosted_state_path(),
        &json!({"baseUrl": "https://hosted.example/v1", "username": "kim"}),
    );

    let models = vec![json!({"id": "claude-sonnet-4"}), json!("gemini-2.5-flash")];
    let applied = engine.apply_hosted_config("hk-123", None, Some(&models)).unwrap();
    assert_eq!(applied.plan, "free");
    assert_eq!(applied.models, Some(2));

    let registry = read_json(&engine.layout().provider_registry_path());
    assert_eq!(registry["provider"]["hosted"]["options"]["baseURL"], "https://hosted.example/v1");
    assert!(registry["provider"]["hosted"]["models"].get("gemini-2.5-flash").is_some());
    let auth = read_json(&engine.layout().auth_path());
    assert_eq!(auth["hosted"], json!({"type": "api", "key": "hk-123"}));
    let status = engine.hosted_usecase().status().unwrap();
    assert_eq!(status["apiKey"], MASK_PLACEHOLDER);

    engine.remove_hosted_config().unwrap();
    let again = engine.remove_hosted_config().unwrap();
    assert_eq!(again.removed_refs, 0);

    let registry = read_json(&engine.layout().provider_registry_path());
    assert!(registry["provider"].get("hosted").is_none());
    assert!(registry["provider"].get("unified-proxy").is_some());
    let behavior = read_json(&engine.layout().behavior_registry_path());
    assert!(!behavior.to_string().contains("hosted/"));
    assert_eq!(behavior["agents"]["custom-helper"]["model"], "unified-proxy/gpt");

    let state = read_json(&engine.layout().hosted_state_path());
    assert_eq!(state["enabled"], false);
    assert_eq!(state["apiKey"], "");
    assert_eq!(state["username"], "kim");
    assert!(read_json(&engine.layout().auth_path()).get("hosted").is_none());
}

#[test]
fn hosted_apply_without_list_keeps_provider_entry() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    write_json(
        &engine.layout().provider_registry_path(),
        &json!({"provider": {"hosted": {"models": {"legacy": {}}}}}),
    );
    let before = fs::read(engine.layout().provider_registry_path()).unwrap();

    let report = engine.apply_hosted_config("hk", Some("pro"), None).unwrap();
    assert_eq!(report.plan, "pro");
    assert!(!report.provider_registry_written);
    assert_eq!(fs::read(engine.layout().provider_registry_path()).unwrap(), before);
}

#[tokio::test]
async fn hosted_apply_online_uses_catalog_models() {
    let dir = TempDir::new().unwrap();
    let layout = ConfigLayout::new(dir.path().join("opencode"))
        .with_auth_dir(dir.path().join("auth"))
        .with_hosted_base_url("https://hosted.example/v1/");
    let catalog = Box::new(FixedCatalog {
        models: vec![json!({"id": "gpt-5"}), json!({"id": "claude-haiku"})],
        calls: Mutex::new(Vec::new()),
    });
    let engine = AppComposition::with_layout(layout).with_catalog(catalog);

    let report = engine.apply_hosted_config_online("hk-9", Some("team")).await.unwrap();
    assert_eq!(report.models, Some(2));

    let registry = read_json(&engine.layout().provider_registry_path());
    let hosted = &registry["provider"]["hosted"];
    assert_eq!(hosted["name"], "Hosted Service");
    assert_eq!(hosted["options"]["baseURL"], "https://hosted.example/v1");
    assert_eq!(
        hosted["models"],
        json!({"gpt-5": {"name": "gpt-5"}, "claude-haiku": {"name": "claude-haiku"}})
    );
    assert!(!report.behavior_registry_written);
    assert!(!engine.layout().behavior_registry_path().exists());
}

#[tokio::test]
async fn hosted_fetch_failure_degrades_to_no_list() {
    let dir = TempDir::new().unwrap();
    let layout = ConfigLayout::new(dir.path().join("opencode"))
        .with_auth_dir(dir.path().join("auth"))
        .with_hosted_base_url("https://hosted.example/v1");
    let engine = AppComposition::with_layout(layout).with_catalog(Box::new(FailingCatalog));

    let report = engine.apply_hosted_config_online("hk", None).await.unwrap();
    assert!(report.enabled);
    assert_eq!(report.models, None);
    assert!(!engine.layout().provider_registry_path().exists());
    assert_eq!(read_json(&engine.layout().hosted_state_path())["enabled"], true);
}

#[tokio::test]
async fn hosted_fetch_failure_keeps_existing_models() {
    let dir = TempDir::new().unwrap();
    let layout = ConfigLayout::new(dir.path().join("opencode"))
        .with_auth_dir(dir.path().join("auth"))
        .with_hosted_base_url("https://hosted.example/v1");
    let engine = AppComposition::with_layout(layout).with_catalog(Box::new(FailingCatalog));
    write_json(
        &engine.layout().provider_registry_path(),
        &json!({"provider": {"hosted": {"models": {"m1": {}, "m2": {}}}}}),
    );
    let before = fs::read(engine.layout().provider_registry_path()).unwrap();

    let report = engine.apply_hosted_config_online("hk", Some("pro")).await.unwrap();
    assert_eq!(report.models, None);
    assert_eq!(fs::read(engine.layout().provider_registry_path()).unwrap(), before);
}

#[test]
fn hosted_apply_then_remove_keeps_user_role_mappings() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    write_json(
        &engine.layout().provider_registry_path(),
        &json!({"provider": {"acme": {"models": {"gpt": {}}}}}),
    );
    let behavior = json!({
        "agents": {"sisyphus": {"model": "acme/gpt"}},
        "categories": {"quick": {"model": "acme/gpt"}}
    });
    write_json(&engine.layout().behavior_registry_path(), &behavior);
    write_json(
        &engine.layout().hosted_state_path(),
        &json!({"baseUrl": "https://hosted.example/v1"}),
    );
    let behavior_bytes = fs::read(engine.layout().behavior_registry_path()).unwrap();

    let models = vec![json!({"id": "claude-sonnet"}), json!({"id": "gemini-flash"})];
    let applied = engine.apply_hosted_config("k1", Some("pro"), Some(&models)).unwrap();
    assert!(applied.provider_registry_written);
    assert!(!applied.behavior_registry_written);
    assert_eq!(fs::read(engine.layout().behavior_registry_path()).unwrap(), behavior_bytes);

    engine.remove_hosted_config().unwrap();
    assert_eq!(read_json(&engine.layout().behavior_registry_path()), behavior);
    let registry = read_json(&engine.layout().provider_registry_path());
    assert_eq!(registry, json!({"provider": {"acme": {"models": {"gpt": {}}}}}));
}

#[test]
fn hosted_apply_twice_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    seed_registries(&engine);
    write_json(
        &engine.layout().hosted_state_path(),
        &json!({"baseUrl": "https://hosted.example/v1"}),
    );
    let models = vec![json!({"id": "claude-sonnet"}), json!("gemini-flash")];
    let paths = [
        engine.layout().provider_registry_path(),
        engine.layout().behavior_registry_path(),
        engine.layout().hosted_state_path(),
        engine.layout().auth_path(),
    ];

    engine.apply_hosted_config("hk", Some("pro"), Some(&models)).unwrap();
    let first: Vec<Vec<u8>> = paths.iter().map(|p| fs::read(p).unwrap()).collect();

    let second = engine.apply_hosted_config("hk", Some("pro"), Some(&models)).unwrap();
    assert!(!second.provider_registry_written);
    assert!(!second.behavior_registry_written);
    let after: Vec<Vec<u8>> = paths.iter().map(|p| fs::read(p).unwrap()).collect();
    assert_eq!(after, first);
}

#[test]
fn hosted_apply_with_malformed_registry_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    fs::create_dir_all(&engine.layout().root).unwrap();
    fs::write(engine.layout().provider_registry_path(), "{ broken").unwrap();

    let models = vec![json!({"id": "m1"})];
    let err = engine.apply_hosted_config("k1", Some("pro"), Some(&models)).unwrap_err();

    assert!(matches!(err, EngineError::MalformedDocument { .. }));
    assert!(!engine.layout().hosted_state_path().exists());
    assert!(!engine.layout().auth_path().exists());
    assert_eq!(
        fs::read_to_string(engine.layout().provider_registry_path()).unwrap(),
        "{ broken"
    );
}

#[test]
fn hosted_remove_rolls_back_when_behavior_write_fails() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    seed_registries(&engine);
    let models = vec![json!({"id": "claude-sonnet"})];
    engine.apply_hosted_config("hk", None, Some(&models)).unwrap();
    let mut behavior = read_json(&engine.layout().behavior_registry_path());
    behavior["agents"]["sisyphus"]["model"] = json!("hosted/claude-sonnet");
    write_json(&engine.layout().behavior_registry_path(), &behavior);
    let registry_before = read_json(&engine.layout().provider_registry_path());

    let store = FailingWriteStore {
        inner: FsDocumentStore,
        fail_on: engine.layout().behavior_registry_path(),
    };
    let usecase = HostedConfigUseCase {
        store: &store,
        layout: engine.layout(),
        catalog: &FailingCatalog,
    };
    let err = usecase.remove().unwrap_err();

    assert!(matches!(err, EngineError::Io { .. }));
    assert_eq!(read_json(&engine.layout().provider_registry_path()), registry_before);
    assert_eq!(read_json(&engine.layout().hosted_state_path())["enabled"], true);
    assert_eq!(read_json(&engine.layout().auth_path())["hosted"]["key"], "hk");
}

#[test]
fn backup_then_restore_reproduces_document() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    seed_registries(&engine);
    let original = read_json(&engine.layout().behavior_registry_path());

    let backup = engine.create_backup(ConfigType::Oh).unwrap();
    assert_eq!(backup.name, "oh-2025-06-01T12-00-00.json");
    assert_eq!(backup.timestamp, "2025-06-01T12-00-00");

    write_json(&engine.layout().behavior_registry_path(), &json!({"agents": {}}));
    let restored = engine.restore_backup(&backup.name).unwrap();
    assert_eq!(restored.config_type, ConfigType::Oh);
    assert_eq!(read_json(&engine.layout().behavior_registry_path()), original);
}

#[test]
fn backups_list_newest_first() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    assert!(engine.list_backups(ConfigType::Opencode).unwrap().is_empty());

    seed_registries(&engine);
    for _ in 0..3 {
        engine.create_backup(ConfigType::Opencode).unwrap();
    }
    engine.create_backup(ConfigType::Oh).unwrap();

    let names: Vec<String> = engine
        .list_backups(ConfigType::Opencode)
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(
        names,
        vec![
            "opencode-2025-06-01T12-00-02.json",
            "opencode-2025-06-01T12-00-01.json",
            "opencode-2025-06-01T12-00-00.json",
        ]
    );
}

#[test]
fn restore_failures_are_classified() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    let backups = engine.layout().backups_dir();
    fs::create_dir_all(&backups).unwrap();
    fs::write(backups.join("oh-2025-01-01T00-00-00.json"), "not json").unwrap();
    fs::write(backups.join("skills-2025-01-01T00-00-00.json"), "{}").unwrap();
    fs::write(backups.join("opencode-2025-01-01T00-00-00.json"), "null").unwrap();

    assert!(matches!(
        engine.restore_backup("oh-1999-01-01T00-00-00.json"),
        Err(EngineError::BackupNotFound(_))
    ));
    assert!(matches!(
        engine.restore_backup("../opencode.json"),
        Err(EngineError::BackupNotFound(_))
    ));
    assert!(matches!(
        engine.restore_backup("oh-2025-01-01T00-00-00.json"),
        Err(EngineError::InvalidBackup(_))
    ));
    assert!(matches!(
        engine.restore_backup("skills-2025-01-01T00-00-00.json"),
        Err(EngineError::UnknownConfigType(_))
    ));
    assert!(matches!(
        engine.restore_backup("opencode-2025-01-01T00-00-00.json"),
        Err(EngineError::InvalidBackup(_))
    ));
    assert!(!engine.layout().provider_registry_path().exists());
}

#[test]
fn create_backup_requires_document() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    assert!(matches!(
        engine.create_backup(ConfigType::Credentials),
        Err(EngineError::MissingDocument(_))
    ));
}

fn seed_templates(dir: &TempDir) {
    let templates = dir.path().join("templates");
    write_json(
        &templates.join("opencode.json"),
        &json!({"provider": {"unified-proxy": {"options": {}, "models": {"gpt": {}}}}}),
    );
    write_json(
        &templates.join("oh-my-opencode.json"),
        &json!({"agents": {"sisyphus": {"model": "unified-proxy/gpt"}}}),
    );
    write_json(&templates.join("credentials.json.template"), &json!({"feishu": {}}));
    fs::write(templates.join("AGENTS.md.template"), "# 主人的助手\n请称呼用户为主人。\n").unwrap();
}

#[test]
fn setup_snapshots_existing_files_and_seeds_documents() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    seed_templates(&dir);
    fs::create_dir_all(&engine.layout().root).unwrap();
    fs::write(engine.layout().agents_md_path(), "my own notes").unwrap();

    let options: SetupOptions = serde_json::from_value(json!({
        "nickname": "Jun",
        "apiKey": "sk-setup",
        "providerName": "Acme",
        "baseURL": "https://acme.example/v1/",
        "webhook": {"enabled": true, "url": "https://hook.example"},
        "database": {"enabled": true, "host": "db", "port": 3306, "username": "u", "password": "p"},
        "deploy": {"fc": {"enabled": true, "accessKeyId": "AK", "accessKeySecret": "SK"}}
    }))
    .unwrap();
    let outcome = engine.setup_config(&options).unwrap();

    let snapshot = outcome.backup_dir.expect("snapshot taken");
    assert_eq!(fs::read_to_string(snapshot.join("AGENTS.md")).unwrap(), "my own notes");
    assert_eq!(
        fs::read_to_string(engine.layout().agents_md_path()).unwrap(),
        "# Jun的助手\n请称呼用户为Jun。\n"
    );

    let registry = read_json(&engine.layout().provider_registry_path());
    assert_eq!(registry["provider"]["acme"]["options"]["baseURL"], "https://acme.example/v1");
    let behavior = read_json(&engine.layout().behavior_registry_path());
    assert_eq!(behavior["agents"]["sisyphus"]["model"], "acme/gpt");

    let auth = read_json(&engine.layout().auth_path());
    assert_eq!(auth["acme"], json!({"type": "api", "key": "sk-setup"}));

    let credentials = read_json(&engine.layout().credentials_path());
    assert_eq!(credentials["model_service"]["api_key"], "sk-setup");
    assert_eq!(credentials["notification"]["webhook"]["platform"], "feishu");
    assert_eq!(credentials["database"]["default"]["type"], "mysql");
    assert_eq!(credentials["deploy"]["aliyun_fc"]["accounts"][0]["access_key_secret"], "SK");
    assert_eq!(credentials["deploy"]["aliyun_fc"]["accounts"][0]["region"], "cn-shanghai");
    assert!(credentials.get("feishu").is_some());
}

#[test]
fn setup_without_templates_fails_before_touching_documents() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);

    let err = engine.setup_config(&SetupOptions::default()).unwrap_err();
    assert!(matches!(err, EngineError::MissingTemplate(_)));
    assert!(!engine.layout().provider_registry_path().exists());
}

#[test]
fn compaction_model_before_setup_is_unset() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    assert_eq!(engine.models_usecase().compaction_model().unwrap(), None);
    assert!(!engine.layout().provider_registry_path().exists());
}

#[test]
fn model_assignment_round_trip() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    assert!(matches!(
        engine.models_usecase().list_available(),
        Err(EngineError::MissingDocument(_))
    ));

    seed_registries(&engine);
    let models = engine.models_usecase().list_available().unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].id, "unified-proxy/gpt");
    assert_eq!(models[0].name, "GPT");

    let mut mapping = ModelMapping::default();
    mapping.categories.insert("quick".into(), "other/fast".into());
    engine.models_usecase().save_agent_models(&mapping).unwrap();
    let behavior = read_json(&engine.layout().behavior_registry_path());
    assert_eq!(behavior["categories"]["quick"]["model"], "other/fast");
    assert_eq!(behavior["agents"]["sisyphus"]["model"], "unified-proxy/gpt");

    let usecase = engine.models_usecase();
    usecase.save_compaction_model(Some("unified-proxy/gpt")).unwrap();
    assert_eq!(usecase.compaction_model().unwrap().as_deref(), Some("unified-proxy/gpt"));
    usecase.save_compaction_model(None).unwrap();
    assert_eq!(usecase.compaction_model().unwrap(), None);
    assert!(read_json(&engine.layout().provider_registry_path()).get("agent").is_none());
}
