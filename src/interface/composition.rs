//! 애플리케이션 조립(composition root) 모듈.

use anyhow::Result;
use serde_json::Value;

use crate::application::config::{ConfigLayout, DEFAULT_HOSTED_TIMEOUT_MS};
use crate::application::ports::{
    BackupStore, Clock, ConfigRepository, DocumentStore, ModelCatalog,
};
use crate::application::usecases::backups::{BackupUseCase, RestoreOutcome};
use crate::application::usecases::credentials::CredentialsUseCase;
use crate::application::usecases::hosted_config::{HostedConfigUseCase, HostedReport};
use crate::application::usecases::inspect_settings::InspectSettingsUseCase;
use crate::application::usecases::models::ModelAssignmentUseCase;
use crate::application::usecases::reconcile_provider::{
    ReconcileProviderUseCase, ReconcileReport,
};
use crate::application::usecases::setup::{SetupOptions, SetupOutcome, SetupUseCase};
use crate::domain::backup::{BackupRef, ConfigType};
use crate::domain::credentials::CredentialDomain;
use crate::domain::error::EngineResult;
use crate::infrastructure::adapters::{
    FsBackupStore, FsDocumentStore, HttpModelCatalog, JsonConfigRepository, SystemClock,
};
use crate::infrastructure::config;

/// 실행 시점 의존성을 한 곳에서 조립하는 컨테이너.
pub struct AppComposition {
    layout: ConfigLayout,
    hosted_timeout_ms: u64,
    config_repo: JsonConfigRepository,
    store: Box<dyn DocumentStore>,
    backups: Box<dyn BackupStore>,
    clock: Box<dyn Clock>,
    catalog: Box<dyn ModelCatalog>,
}

impl AppComposition {
    /// 병합된 omoconf 설정으로 문서 배치를 정해 조립한다.
    pub fn from_settings() -> Result<Self> {
        let config_repo = JsonConfigRepository;
        let settings = config_repo.load()?;
        let layout = config::layout_for(&settings)?;
        Ok(Self::with_layout(layout).with_hosted_timeout_ms(settings.hosted_timeout_ms()))
    }

    /// 설정 루트를 직접 지정해 조립한다(라이브러리 호출/테스트용).
    pub fn with_layout(layout: ConfigLayout) -> Self {
        Self {
            backups: Box::new(FsBackupStore::new(layout.backups_dir())),
            layout,
            hosted_timeout_ms: DEFAULT_HOSTED_TIMEOUT_MS,
            config_repo: JsonConfigRepository,
            store: Box::new(FsDocumentStore),
            clock: Box::new(SystemClock),
            catalog: Box::new(HttpModelCatalog),
        }
    }

    pub fn with_hosted_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.hosted_timeout_ms = timeout_ms;
        self
    }

    /// 시계 어댑터를 외부에서 주입한다.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 모델 목록 조회 어댑터를 외부에서 주입한다.
    pub fn with_catalog(mut self, catalog: Box<dyn ModelCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn layout(&self) -> &ConfigLayout {
        &self.layout
    }

    pub fn credentials_usecase(&self) -> CredentialsUseCase<'_> {
        CredentialsUseCase {
            store: self.store.as_ref(),
            layout: &self.layout,
        }
    }

    pub fn reconcile_usecase(&self) -> ReconcileProviderUseCase<'_> {
        ReconcileProviderUseCase {
            store: self.store.as_ref(),
            layout: &self.layout,
        }
    }

    pub fn hosted_usecase(&self) -> HostedConfigUseCase<'_> {
        HostedConfigUseCase {
            store: self.store.as_ref(),
            layout: &self.layout,
            catalog: self.catalog.as_ref(),
        }
    }

    pub fn backup_usecase(&self) -> BackupUseCase<'_> {
        BackupUseCase {
            store: self.store.as_ref(),
            backups: self.backups.as_ref(),
            clock: self.clock.as_ref(),
            layout: &self.layout,
        }
    }

    pub fn setup_usecase(&self) -> SetupUseCase<'_> {
        SetupUseCase {
            store: self.store.as_ref(),
            backups: self.backups.as_ref(),
            clock: self.clock.as_ref(),
            layout: &self.layout,
        }
    }

    pub fn models_usecase(&self) -> ModelAssignmentUseCase<'_> {
        ModelAssignmentUseCase {
            store: self.store.as_ref(),
            layout: &self.layout,
        }
    }

    /// 설정 점검 유스케이스를 생성한다.
    pub fn inspect_settings_usecase(&self) -> InspectSettingsUseCase<'_> {
        InspectSettingsUseCase {
            config_repo: &self.config_repo,
        }
    }

    pub fn get_masked_credential_view(&self, domain: CredentialDomain) -> EngineResult<Value> {
        self.credentials_usecase().masked_view(domain)
    }

    pub fn save_credential_view(
        &self,
        domain: CredentialDomain,
        record: Value,
    ) -> EngineResult<()> {
        self.credentials_usecase().save(domain, record)
    }

    pub fn reconcile_provider(
        &self,
        provider_name: Option<&str>,
        base_url: Option<&str>,
    ) -> EngineResult<ReconcileReport> {
        self.reconcile_usecase().execute(provider_name, base_url)
    }

    /// 원격 목록이 주어지면 그대로 쓰고, 없으면 provider 항목을 건드리지 않는다.
    pub fn apply_hosted_config(
        &self,
        api_key: &str,
        plan: Option<&str>,
        remote_models: Option<&[Value]>,
    ) -> EngineResult<HostedReport> {
        self.hosted_usecase().apply(api_key, plan, remote_models)
    }

    /// 원격 모델 목록을 조회해 적용한다. 조회 실패는 목록 없음으로 처리한다.
    pub async fn apply_hosted_config_online(
        &self,
        api_key: &str,
        plan: Option<&str>,
    ) -> EngineResult<HostedReport> {
        self.hosted_usecase()
            .apply_with_catalog(api_key, plan, self.hosted_timeout_ms)
            .await
    }

    pub fn remove_hosted_config(&self) -> EngineResult<HostedReport> {
        self.hosted_usecase().remove()
    }

    pub fn list_backups(&self, config_type: ConfigType) -> EngineResult<Vec<BackupRef>> {
        self.backup_usecase().list(config_type)
    }

    pub fn create_backup(&self, config_type: ConfigType) -> EngineResult<BackupRef> {
        self.backup_usecase().create(config_type)
    }

    pub fn restore_backup(&self, name: &str) -> EngineResult<RestoreOutcome> {
        self.backup_usecase().restore(name)
    }

    pub fn setup_config(&self, options: &SetupOptions) -> EngineResult<SetupOutcome> {
        self.setup_usecase().execute(options)
    }
}
