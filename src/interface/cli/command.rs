//! CLI 명령 파싱 모듈.

use std::io::Read;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use crate::application::usecases::setup::SetupOptions;
use crate::domain::backup::ConfigType;
use crate::domain::credentials::CredentialDomain;
use crate::domain::model_mapping::ModelMapping;

#[derive(Debug, Parser)]
#[command(name = "omoconf")]
#[command(about = "Keep opencode / oh-my-opencode configuration consistent without losing secrets")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Read or save a masked credential view
    #[command(subcommand)]
    Credentials(CredentialsCommand),
    /// Propagate a provider rename or base URL change
    #[command(subcommand)]
    Provider(ProviderCommand),
    /// Apply, remove or inspect the hosted service slot
    #[command(subcommand)]
    Hosted(HostedCommand),
    /// Create, list or restore document backups
    #[command(subcommand)]
    Backup(BackupCommand),
    /// First-time setup from bundled templates (JSON options, `-` for stdin)
    Setup { options: Option<String> },
    /// List models and assign them to agents/categories
    #[command(subcommand)]
    Models(ModelsCommand),
    /// Show effective merged omoconf settings
    Settings,
}

#[derive(Debug, Subcommand)]
enum CredentialsCommand {
    Show { domain: String },
    /// Save an edited view (JSON, `-` for stdin); placeholders keep stored secrets
    Save { domain: String, record: String },
}

#[derive(Debug, Subcommand)]
enum ProviderCommand {
    Reconcile(ReconcileArgs),
}

#[derive(Debug, Args)]
struct ReconcileArgs {
    /// Provider display name (also the source of the provider id)
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Debug, Subcommand)]
enum HostedCommand {
    Apply {
        #[arg(long)]
        api_key: String,
        #[arg(long)]
        plan: Option<String>,
        /// Skip fetching the remote model list
        #[arg(long)]
        offline: bool,
    },
    Remove,
    Status,
    SetBaseUrl { url: String },
}

#[derive(Debug, Subcommand)]
enum BackupCommand {
    List { config_type: String },
    Create { config_type: String },
    Restore { name: String },
}

#[derive(Debug, Subcommand)]
enum ModelsCommand {
    List,
    /// Assign models: `{"agents": {...}, "categories": {...}}` (JSON, `-` for stdin)
    Assign { mapping: String },
    /// Show the compaction model, or change it with --set / --clear
    Compaction {
        #[arg(long, conflicts_with = "clear")]
        set: Option<String>,
        #[arg(long)]
        clear: bool,
    },
}

/// 파싱이 끝난 실행 요청.
#[derive(Debug)]
pub enum CliAction {
    ShowCredentials(CredentialDomain),
    SaveCredentials(CredentialDomain, Value),
    ReconcileProvider {
        name: Option<String>,
        base_url: Option<String>,
    },
    ApplyHosted {
        api_key: String,
        plan: Option<String>,
        offline: bool,
    },
    RemoveHosted,
    HostedStatus,
    SetHostedBaseUrl(String),
    ListBackups(ConfigType),
    CreateBackup(ConfigType),
    RestoreBackup(String),
    Setup(SetupOptions),
    ListModels,
    AssignModels(ModelMapping),
    ShowCompaction,
    SetCompaction(Option<String>),
    InspectSettings,
}

impl Cli {
    pub fn parse_action() -> Result<CliAction, String> {
        Cli::parse().into_action()
    }

    fn into_action(self) -> Result<CliAction, String> {
        let action = match self.command {
            Commands::Credentials(CredentialsCommand::Show { domain }) => {
                CliAction::ShowCredentials(parse_domain(&domain)?)
            }
            Commands::Credentials(CredentialsCommand::Save { domain, record }) => {
                CliAction::SaveCredentials(parse_domain(&domain)?, read_payload(&record)?)
            }
            Commands::Provider(ProviderCommand::Reconcile(args)) => CliAction::ReconcileProvider {
                name: args.name,
                base_url: args.base_url,
            },
            Commands::Hosted(HostedCommand::Apply {
                api_key,
                plan,
                offline,
            }) => CliAction::ApplyHosted {
                api_key,
                plan,
                offline,
            },
            Commands::Hosted(HostedCommand::Remove) => CliAction::RemoveHosted,
            Commands::Hosted(HostedCommand::Status) => CliAction::HostedStatus,
            Commands::Hosted(HostedCommand::SetBaseUrl { url }) => CliAction::SetHostedBaseUrl(url),
            Commands::Backup(BackupCommand::List { config_type }) => {
                CliAction::ListBackups(parse_config_type(&config_type)?)
            }
            Commands::Backup(BackupCommand::Create { config_type }) => {
                CliAction::CreateBackup(parse_config_type(&config_type)?)
            }
            Commands::Backup(BackupCommand::Restore { name }) => CliAction::RestoreBackup(name),
            Commands::Setup { options } => {
                let options = match options {
                    Some(raw) => serde_json::from_value(read_payload(&raw)?)
                        .map_err(|e| format!("invalid setup options: {e}"))?,
                    None => SetupOptions::default(),
                };
                CliAction::Setup(options)
            }
            Commands::Models(ModelsCommand::List) => CliAction::ListModels,
            Commands::Models(ModelsCommand::Assign { mapping }) => {
                let mapping = serde_json::from_value(read_payload(&mapping)?)
                    .map_err(|e| format!("invalid model mapping: {e}"))?;
                CliAction::AssignModels(mapping)
            }
            Commands::Models(ModelsCommand::Compaction { set, clear }) => match (set, clear) {
                (Some(model), _) => CliAction::SetCompaction(Some(model)),
                (None, true) => CliAction::SetCompaction(None),
                (None, false) => CliAction::ShowCompaction,
            },
            Commands::Settings => CliAction::InspectSettings,
        };
        Ok(action)
    }
}

fn parse_domain(raw: &str) -> Result<CredentialDomain, String> {
    raw.parse().map_err(|e: crate::domain::error::EngineError| e.to_string())
}

fn parse_config_type(raw: &str) -> Result<ConfigType, String> {
    raw.parse().map_err(|e: crate::domain::error::EngineError| e.to_string())
}

/// 인라인 JSON 또는 `-`(표준 입력)을 읽는다.
fn read_payload(raw: &str) -> Result<Value, String> {
    let text = if raw == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        buf
    } else {
        raw.to_string()
    };
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON payload: {e}"))
}
