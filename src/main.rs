mod compliance;
mod config;
mod gate;
mod models;
mod report;
mod session;
mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, ResultsTarget};
use gate::Gate;
use models::CheckMode;
use report::{LocalDir, ResultsStore};
use session::SshSession;

#[derive(Parser, Debug)]
#[command(name = "iface-guard", version, about = "Router interface naming checks around config commits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the candidate configuration and fail if any interface is misnamed
    PreCommit,
    /// Report on the running configuration after a commit
    PostCommit,
}

impl Commands {
    fn mode(&self) -> CheckMode {
        match self {
            Commands::PreCommit => CheckMode::PreCommit,
            Commands::PostCommit => CheckMode::PostCommit,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing; stdout is reserved for the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iface_guard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = Config::load();
    cfg.validate()?;
    let mode = cli.command.mode();
    let policy = cfg.naming_policy();
    tracing::info!("Device: {}:{}", cfg.device_host, cfg.device_ssh_port);
    tracing::info!("Path: {}", cfg.router_path);
    tracing::info!("Policy: {}", compliance::NamingPolicy::describe(&policy));

    let session = SshSession::connect(
        cfg.ssh_target(),
        cfg.running_command.clone(),
        cfg.candidate_command.clone(),
    )
    .await
    .with_context(|| format!("{} check could not start", mode))?;

    let store: Box<dyn ResultsStore> = match cfg.results_target {
        ResultsTarget::Local => Box::new(LocalDir::new(&cfg.results_dir)),
        ResultsTarget::Device => Box::new(session.flash(&cfg.results_device_dir)),
    };

    let gate = Gate {
        session: &session,
        store: store.as_ref(),
        policy: &policy,
        path: &cfg.router_path,
    };

    let summary = gate.run(mode, chrono::Local::now().naive_local()).await?;
    tracing::debug!("Run summary: {}", serde_json::to_string(&summary)?);
    if !summary.persistence.is_persisted() {
        tracing::warn!("{} check finished without a stored report", mode);
    }
    tracing::info!("{} check complete", mode);
    Ok(())
}
