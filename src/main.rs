// src/main.rs

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use treeota::settings::DEFAULT_SETTINGS_PATH;
use treeota::store::{OstreeStoreConfig, ostree::DEFAULT_COMMAND_TIMEOUT};
use treeota::{
    ClientOptions, ClientSettings, ClientState, ConfigError, OperationOutcome, OstreeCommandStore,
    OtaClient, RepositoryConfig,
};

#[derive(Parser)]
#[command(name = "treeota")]
#[command(author, version, about = "Over-the-air updates for tree-based deployments", long_about = None)]
struct Cli {
    /// Client settings file
    #[arg(short, long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    /// Print the resulting state as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show booted, default and rollback revisions (no network access)
    Status,
    /// Check the remote for a newer revision
    Check,
    /// Fetch a revision (default: the remote head)
    Fetch {
        revision: Option<String>,
    },
    /// Make a revision the next boot target (default: the remote head)
    Apply {
        revision: Option<String>,
    },
    /// Make the most recent previous deployment the next boot target
    Rollback,
    /// Re-read local deployment state
    Refresh,
    /// Manage the repository configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the repository configuration
    Show,
    /// Write a new repository configuration
    Set(ConfigArgs),
    /// Delete the repository configuration
    Remove,
}

#[derive(Args)]
struct ConfigArgs {
    /// Repository URL
    #[arg(long)]
    url: String,
    /// Skip GPG verification of commits
    #[arg(long)]
    no_gpg_verify: bool,
    /// Accept any TLS certificate
    #[arg(long)]
    tls_permissive: bool,
    /// Client certificate for TLS authentication
    #[arg(long, default_value = "")]
    client_cert: String,
    /// Client key for TLS authentication
    #[arg(long, default_value = "")]
    client_key: String,
    /// CA bundle used to verify the server
    #[arg(long, default_value = "")]
    tls_ca: String,
}

/// Load the repository config; absence is fatal only when the remote is needed
fn load_repository(path: &Path, required: bool) -> Result<Option<RepositoryConfig>> {
    match RepositoryConfig::load_from(path) {
        Ok(config) => Ok(Some(config)),
        Err(ConfigError::NotFound(p)) if !required => {
            warn!("No repository config at {}, remote operations unavailable", p);
            Ok(None)
        }
        Err(e) => Err(e).context("Failed to load repository config"),
    }
}

fn build_store(settings: &ClientSettings) -> Result<OstreeCommandStore> {
    let mut config = match &settings.ostree_binary {
        Some(binary) => OstreeStoreConfig {
            binary: binary.clone(),
            sysroot: settings.sysroot.clone(),
            remote_name: settings.remote_name.clone(),
            branch: settings.branch.clone(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        },
        None => OstreeStoreConfig::discover(&settings.sysroot, &settings.remote_name, &settings.branch)
            .context("Cannot locate the ostree tool")?,
    };
    config.timeout = settings.command_timeout();
    Ok(OstreeCommandStore::new(config))
}

fn print_state(state: &ClientState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&state.to_json())?);
        return Ok(());
    }

    println!("Booted:   {}", or_unknown(&state.booted.revision));
    match &state.remote {
        Some(remote) => println!("Remote:   {}", remote.revision),
        None => println!("Remote:   (not checked)"),
    }
    if let Some(default) = &state.default {
        println!("Default:  {}", default.revision);
    }
    match &state.rollback {
        Some(rollback) => println!(
            "Rollback: {} ({} tree(s) available)",
            rollback.info.revision, rollback.tree_count
        ),
        None => println!("Rollback: (none)"),
    }
    println!("Update available:   {}", yes_no(state.update_available()));
    println!("Rollback available: {}", yes_no(state.rollback_available()));
    if state.restart_required {
        println!("Restart required to boot the new default tree");
    }
    if !state.status.is_empty() {
        println!("Status:   {}", state.status);
    }
    Ok(())
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() { "(unknown)" } else { value }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Wait for the dispatched command and turn a failure into an error
async fn finish(client: &mut OtaClient) -> Result<OperationOutcome> {
    match client.settle().await? {
        Some(OperationOutcome::Failed(reason)) => bail!(reason),
        Some(outcome) => Ok(outcome),
        None => bail!("no operation was running"),
    }
}

/// Resolve the revision to act on, checking the remote when none was given
async fn target_revision(client: &mut OtaClient, revision: Option<String>) -> Result<String> {
    if let Some(revision) = revision {
        return Ok(revision);
    }

    client.check_for_update()?;
    finish(client).await?;
    let state = client.snapshot();
    if !state.update_available() {
        bail!("System is up to date, nothing to do");
    }
    state
        .remote
        .map(|remote| remote.revision)
        .context("Remote revision unknown after check")
}

fn handle_config(command: ConfigCommands, settings: &ClientSettings) -> Result<()> {
    let path = &settings.repo_config;
    match command {
        ConfigCommands::Show => {
            let config = RepositoryConfig::load_from(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            print!("{}", config.to_resource_string()?);
        }
        ConfigCommands::Set(args) => {
            let config = RepositoryConfig {
                url: args.url,
                gpg_verify: !args.no_gpg_verify,
                tls_client_cert_path: args.client_cert,
                tls_client_key_path: args.client_key,
                tls_permissive: args.tls_permissive,
                tls_ca_path: args.tls_ca,
            };

            let unchanged = RepositoryConfig::load_from(path)
                .map(|current| RepositoryConfig::equals(&current, &config))
                .unwrap_or(false);
            if unchanged {
                println!("Repository config unchanged");
                return Ok(());
            }

            config.save(path)?;
            println!("Repository config written to {}", path.display());
            println!("Run 'treeota check' to refresh the remote revision");
        }
        ConfigCommands::Remove => {
            if path.exists() {
                fs::remove_file(path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                println!("Removed {}", path.display());
            } else {
                println!("No repository config at {}", path.display());
            }
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = ClientSettings::load(&cli.settings)?;

    let command = match cli.command {
        Commands::Config(command) => return handle_config(command, &settings),
        other => other,
    };

    let needs_remote = match &command {
        Commands::Check => true,
        Commands::Fetch { revision } | Commands::Apply { revision } => revision.is_none(),
        Commands::Status | Commands::Rollback | Commands::Refresh | Commands::Config(_) => false,
    };

    let repository = load_repository(&settings.repo_config, needs_remote)?;
    let store = build_store(&settings)?;

    let mut options = ClientOptions::for_sysroot(&settings.sysroot);
    options.repository = repository;
    let mut client = OtaClient::new(store, options)?;

    client.refresh_info()?;
    finish(&mut client).await?;

    match command {
        Commands::Status | Commands::Refresh | Commands::Config(_) => {}
        Commands::Check => {
            client.check_for_update()?;
            finish(&mut client).await?;
        }
        Commands::Fetch { revision } => {
            let revision = target_revision(&mut client, revision).await?;
            info!("Fetching {}", revision);
            client.fetch_update(&revision)?;
            finish(&mut client).await?;
        }
        Commands::Apply { revision } => {
            let revision = target_revision(&mut client, revision).await?;
            client.fetch_update(&revision)?;
            finish(&mut client).await?;
            client.apply_update(&revision)?;
            finish(&mut client).await?;
        }
        Commands::Rollback => {
            client.rollback()?;
            finish(&mut client).await?;
        }
    }

    print_state(client.state(), cli.json)
}
