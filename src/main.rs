//! Zonegate CLI - verify DNS zone propagation before cluster bootstrap

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zonegate::bootstrap::DnsGate;
use zonegate::poll::PollPolicy;
use zonegate::provider::{create_provider, MemoryProvider, ProviderType};
use zonegate::resolver::{PublicResolver, SystemResolver};
use zonegate::verifier::Propagation;
use zonegate::ZoneLivenessVerifier;

/// Zonegate - DNS propagation gate for cluster bootstrap pipelines
#[derive(Parser, Debug)]
#[command(name = "zonegate", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify that a hosted zone propagates records to public DNS
    ///
    /// Creates a short-TTL TXT probe record in the zone (skipping creation
    /// if it already exists) and polls until it resolves or the attempt
    /// bound is exhausted. Exits non-zero on any fatal outcome so pipeline
    /// scripts can halt bootstrap.
    Verify(VerifyArgs),
}

/// Verify mode arguments
#[derive(Parser, Debug)]
struct VerifyArgs {
    /// Hosted zone name to verify (e.g., example.com)
    #[arg(short, long)]
    zone: String,

    /// DNS provider managing the zone
    ///
    /// With "memory" the zone is seeded in process memory and the gate
    /// resolves against the provider's own records, so the full
    /// create-and-poll flow succeeds locally without a real DNS account.
    #[arg(long, env = "ZONEGATE_PROVIDER", default_value = "memory")]
    provider: ProviderType,

    /// Maximum resolution attempts before giving up (0 = poll forever)
    #[arg(long, default_value = "100")]
    max_attempts: u32,

    /// Seconds to wait between resolution attempts
    #[arg(long, default_value = "10")]
    interval_secs: u64,

    /// Overall deadline in seconds, independent of the attempt bound
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Apply jitter to the poll interval
    #[arg(long)]
    jitter: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Verify(args) => run_verify(args).await,
    }
}

/// Run zone verification as a standalone gate
async fn run_verify(args: VerifyArgs) -> anyhow::Result<()> {
    type Collaborators = (
        Arc<dyn zonegate::provider::DnsProvider>,
        Arc<dyn zonegate::resolver::TxtResolver>,
        Arc<dyn zonegate::resolver::TxtResolver>,
    );

    let (provider, primary, fallback): Collaborators = match args.provider {
        // The memory provider starts empty; seed the requested zone and
        // resolve against the provider's own records so the full
        // create-and-poll flow can be exercised locally.
        ProviderType::Memory => {
            tracing::info!(zone = %args.zone, "Using memory provider, seeding zone");
            let memory =
                Arc::new(MemoryProvider::new().with_zone(args.zone.trim_end_matches('.')));
            (memory.clone(), memory.clone(), memory)
        }
        other => {
            let provider = create_provider(other).map_err(|e| anyhow::anyhow!("{}", e))?;
            let primary =
                SystemResolver::from_system_conf().map_err(|e| anyhow::anyhow!("{}", e))?;
            (provider, Arc::new(primary), Arc::new(PublicResolver::new()))
        }
    };

    let policy = PollPolicy {
        max_attempts: args.max_attempts,
        interval: Duration::from_secs(args.interval_secs),
        jitter: args.jitter,
    };

    let verifier = ZoneLivenessVerifier::new(provider, primary, fallback).with_policy(policy);
    let gate = DnsGate::new(args.zone.clone(), verifier);

    // Ctrl-C aborts the wait instead of sitting out the full bound
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, aborting DNS gate");
            signal_cancel.cancel();
        }
    });

    let timeout = args.timeout_secs.map(Duration::from_secs);
    let report = gate.run_with_timeout(&cancel, timeout).await.map_err(|e| {
        match e.remediation() {
            Some(guidance) => anyhow::anyhow!("{}\n  remediation: {}", e, guidance),
            None => anyhow::anyhow!("{}", e),
        }
    })?;

    match report.outcome {
        Propagation::AlreadyLive => {
            println!("zone {} is already live", report.zone);
        }
        Propagation::Propagated { attempts } => {
            println!(
                "zone {} propagated after {} attempt(s) in {:?}",
                report.zone, attempts, report.elapsed
            );
        }
    }

    Ok(())
}
