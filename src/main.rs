// ABOUTME: Entry point for the cutover CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use cutover::build::CommandBuilder;
use cutover::config::{self, Config};
use cutover::deploy::{CancelToken, DeployRequest, Orchestrator, manual_rollback};
use cutover::error::{Error, Result};
use cutover::health::HttpProbe;
use cutover::migrate::{CommandMigrator, MigrationSet};
use cutover::secrets::{self, EnvSecretStore};
use cutover::store::StateStore;
use cutover::transport::DockerTransport;
use cutover::types::{EnvName, SourceRevision};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init {
            service,
            repository,
            force,
        } => {
            let cwd = env::current_dir().expect("Failed to get current directory");
            config::init_config(&cwd, service.as_deref(), repository.as_deref(), force)
        }
        Commands::Deploy {
            environment,
            revision,
        } => {
            let cwd = env::current_dir().expect("Failed to get current directory");
            let config = Config::discover(&cwd)?;

            let environment = parse_env_name(&environment)?;
            let revision = resolve_revision(revision)?;

            deploy(config, environment, revision).await
        }
        Commands::Rollback { environment } => {
            let cwd = env::current_dir().expect("Failed to get current directory");
            let config = Config::discover(&cwd)?;

            let environment = parse_env_name(&environment)?;

            rollback(config, environment).await
        }
        Commands::Status { environment } => {
            let cwd = env::current_dir().expect("Failed to get current directory");
            let config = Config::discover(&cwd)?;

            let environment = environment.as_deref().map(parse_env_name).transpose()?;

            status(&config, environment.as_ref())
        }
    }
}

fn parse_env_name(value: &str) -> Result<EnvName> {
    EnvName::new(value).map_err(|e| Error::InvalidConfig(e.to_string()))
}

/// Revision from the flag or the CI-provided environment variable.
fn resolve_revision(flag: Option<String>) -> Result<SourceRevision> {
    let raw = match flag {
        Some(r) => r,
        None => env::var("CUTOVER_REVISION").map_err(|_| Error::MissingRevision)?,
    };
    SourceRevision::new(&raw).map_err(|e| Error::InvalidConfig(e.to_string()))
}

/// Deploy one revision to one environment.
async fn deploy(config: Config, environment: EnvName, revision: SourceRevision) -> Result<()> {
    let env_config = config.environment(&environment)?.clone();

    let store =
        StateStore::open(config.state_root()).map_err(|e| Error::Store(e.to_string()))?;
    let log_dir = store.root().join("logs");

    let workdir = config
        .build
        .workdir
        .clone()
        .unwrap_or_else(|| env::current_dir().expect("Failed to get current directory"));

    let builder = CommandBuilder::new(
        &config.build.command,
        &config.artifact.repository,
        workdir,
        log_dir,
    );
    let transport =
        DockerTransport::connect_local().map_err(|e| Error::Transport(e.to_string()))?;
    let migrator = CommandMigrator::new(
        config
            .migrations
            .as_ref()
            .map(|m| m.command.clone())
            .unwrap_or_default(),
    );
    let probe = HttpProbe::new();

    let migration_set = match &config.migrations {
        Some(m) => {
            Some(MigrationSet::load(&m.dir).map_err(|e| Error::Migrations(e.to_string()))?)
        }
        None => None,
    };

    // Resolve secret handles right before the build; values never persist.
    let secret_store = EnvSecretStore::new();
    let resolved = secrets::resolve_all(&secret_store, &env_config.secrets)
        .await
        .map_err(|e| Error::Secrets(e.to_string()))?;

    let orchestrator = Orchestrator::new(builder, transport, migrator, probe, store)
        .with_retry_policy(config.transport.retry_policy())
        .with_build_timeout(config.build.timeout)
        .with_transport_timeout(config.transport.timeout);

    // Ctrl-C cancels between phases; the running phase always completes.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("cancellation requested; finishing current phase");
                cancel.cancel();
            }
        });
    }

    println!(
        "Deploying {} ({}) to {}",
        config.service, revision, env_config.name
    );

    let request = DeployRequest {
        revision,
        environment: env_config.name.clone(),
    };

    let release = orchestrator
        .deploy(
            &env_config,
            request,
            migration_set.as_ref(),
            &resolved,
            &cancel,
        )
        .await
        .map_err(|e| Error::Deploy(e.to_string()))?;

    println!("  ✓ Release {} is live", release.id);
    Ok(())
}

/// Roll back to the previous release on one environment.
async fn rollback(config: Config, environment: EnvName) -> Result<()> {
    let env_config = config.environment(&environment)?.clone();

    let store =
        StateStore::open(config.state_root()).map_err(|e| Error::Store(e.to_string()))?;
    let transport =
        DockerTransport::connect_local().map_err(|e| Error::Transport(e.to_string()))?;
    let probe = HttpProbe::new();

    let gate = env_config.health.gate();
    let target = env_config.health.target(&env_config.host);
    let retry = config.transport.retry_policy();

    println!("Rolling back {} on {}", config.service, env_config.name);

    let restored = manual_rollback(
        &env_config.name,
        &store,
        &transport,
        &retry,
        &env_config.host,
        &gate,
        &probe,
        &target,
    )
    .await
    .map_err(|e| Error::Deploy(e.to_string()))?;

    println!("  ✓ Release {} is live again", restored);
    Ok(())
}

/// Print environment pointers and recent releases.
fn status(config: &Config, environment: Option<&EnvName>) -> Result<()> {
    let store =
        StateStore::open(config.state_root()).map_err(|e| Error::Store(e.to_string()))?;

    for env_config in config.environments.iter() {
        if let Some(only) = environment
            && &env_config.name != only
        {
            continue;
        }

        let state = store
            .environment(&env_config.name)
            .map_err(|e| Error::Store(e.to_string()))?;

        println!("{}:", env_config.name);
        println!(
            "  live:     {}",
            state.live.map(|id| id.to_string()).unwrap_or_else(|| "none".into())
        );
        println!(
            "  previous: {}",
            state
                .previous
                .map(|id| id.to_string())
                .unwrap_or_else(|| "none".into())
        );

        let releases = store
            .recent_releases(Some(&env_config.name), 5)
            .map_err(|e| Error::Store(e.to_string()))?;
        if !releases.is_empty() {
            println!("  recent:");
            for release in releases {
                match &release.reason {
                    Some(reason) => println!(
                        "    {} {} {} ({})",
                        release.id, release.revision, release.status, reason
                    ),
                    None => println!("    {} {} {}", release.id, release.revision, release.status),
                }
            }
        }
    }

    Ok(())
}
