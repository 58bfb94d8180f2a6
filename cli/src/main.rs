//! dustsweep: consolidate the dust UTXOs of one wallet address.

mod config;
mod terminal;

use anyhow::Context;
use clap::Parser;
use config::{ConfigError, SweepConfig};
use dustsweep_rpc::DaemonClient;
use dustsweep_types::{Amount, Profile};
use dustsweep_utils::{format_coins, init_logging, LogFormat};
use dustsweep_wallet_core::{scan, Notice, Outcome, Session, SweepError};
use std::path::PathBuf;
use std::process::ExitCode;
use terminal::TerminalOperator;

#[derive(Parser)]
#[command(
    name = "dustsweep",
    version,
    about = "Consolidate dust UTXOs of a wallet address into one output"
)]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "DUSTSWEEP_CONFIG")]
    config: Option<PathBuf>,

    /// Wallet daemon RPC host.
    #[arg(long, env = "DUSTSWEEP_RPC_HOST")]
    rpc_host: Option<String>,

    /// Wallet daemon RPC port.
    #[arg(long, env = "DUSTSWEEP_RPC_PORT")]
    rpc_port: Option<u16>,

    #[arg(long, env = "DUSTSWEEP_RPC_USER")]
    rpc_user: Option<String>,

    #[arg(long, env = "DUSTSWEEP_RPC_PASSWORD", hide_env_values = true)]
    rpc_password: Option<String>,

    /// Policy profile: "standard" or "bulk".
    #[arg(long, env = "DUSTSWEEP_PROFILE")]
    profile: Option<Profile>,

    /// Log output format: "human" or "json".
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "DUSTSWEEP_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Interactively consolidate one address's dust (default).
    Sweep,
    /// List addresses holding two or more dust UTXOs without building anything.
    Scan {
        /// Dust threshold in satoshis (defaults to the profile's).
        #[arg(long)]
        threshold: Option<u64>,
    },
}

impl Cli {
    /// Merge file settings with flag and env overrides.
    fn resolve_config(&self) -> anyhow::Result<SweepConfig> {
        let mut cfg = match &self.config {
            Some(path) => SweepConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SweepConfig::default(),
        };

        if let Some(host) = &self.rpc_host {
            cfg.rpc_host = host.clone();
        }
        if let Some(port) = self.rpc_port {
            cfg.rpc_port = port;
        }
        if let Some(user) = &self.rpc_user {
            cfg.rpc_user = Some(user.clone());
        }
        if let Some(password) = &self.rpc_password {
            cfg.rpc_password = Some(password.clone());
        }
        if let Some(profile) = self.profile {
            cfg.profile = profile;
        }
        if let Some(format) = self.log_format {
            cfg.log_format = format;
        }
        if let Some(level) = &self.log_level {
            cfg.log_level = level.clone();
        }
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let cfg = cli.resolve_config()?;
    init_logging(cfg.log_format, &cfg.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    let connection = match cfg.connection() {
        Ok(connection) => connection,
        Err(e @ ConfigError::Missing(_)) => {
            println!("{e}");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e.into()),
    };
    let policy = cfg.policy();
    tracing::info!(
        url = %connection.url,
        profile = %cfg.profile,
        threshold = policy.dust_threshold.to_sat(),
        max_inputs = policy.max_inputs,
        "dustsweep starting"
    );

    let client = DaemonClient::new(connection.url, connection.auth, connection.timeout)
        .context("creating RPC client")?;

    match cli.command.unwrap_or(Command::Sweep) {
        Command::Scan { threshold } => {
            let threshold = threshold.map(Amount::from_sat).unwrap_or(policy.dust_threshold);
            run_scan(&client, threshold, &cfg.ticker).await
        }
        Command::Sweep => {
            let mut operator = TerminalOperator::stdio(cfg.ticker.clone());
            let outcome = Session::new(&client, &mut operator, policy).run().await;
            Ok(report(outcome))
        }
    }
}

async fn run_scan(
    client: &DaemonClient,
    threshold: Amount,
    ticker: &str,
) -> anyhow::Result<ExitCode> {
    let candidates = match scan(client, threshold).await {
        Ok(candidates) => candidates,
        Err(SweepError::ThresholdTooLarge { threshold }) => {
            println!(
                "Whole coins are not dust. Value entered was: {}",
                format_coins(threshold, ticker)
            );
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::SUCCESS);
        }
    };

    if candidates.is_empty() {
        println!("{}", Notice::NoDustAddresses);
        return Ok(ExitCode::SUCCESS);
    }
    for c in &candidates {
        println!(
            "{}  {} dust UTXOs  {}",
            c.address,
            c.dust_count,
            format_coins(c.dust_total, ticker)
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Print whatever the session did not already tell the operator and pick
/// the exit code. Only an unconfirmed broadcast exits non-zero.
fn report(outcome: Outcome) -> ExitCode {
    match outcome {
        Outcome::Done(_) | Outcome::Cancelled(_) | Outcome::NothingToDo(_) => ExitCode::SUCCESS,
        Outcome::Aborted(SweepError::ThresholdTooLarge { .. }) => ExitCode::SUCCESS,
        Outcome::Aborted(e) => {
            eprintln!("Error: {e}");
            ExitCode::SUCCESS
        }
        Outcome::BroadcastUnconfirmed {
            expected_txid,
            signed_hex,
            error,
        } => {
            eprintln!("Broadcast result unknown: {error}");
            eprintln!(
                "The transaction may already be on the network. Look up {expected_txid} before retrying."
            );
            eprintln!("Signed transaction: {signed_hex}");
            ExitCode::FAILURE
        }
    }
}
