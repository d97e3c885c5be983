use anyhow::{Context, Result};
use at_schemas::{ClaimPayload, ExecutionPayload, WitnessPayload};
use at_store::Stream;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "agenttrust")]
#[command(about = "agenttrust workspace CLI", long_about = None)]
struct Cli {
    /// Workspace root containing (or to contain) `.agenttrust/`.
    #[arg(long, global = true, default_value = ".")]
    workspace: PathBuf,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the `.agenttrust/` directory layout.
    Init,

    /// Verify one stream's hash chain and exit 1 on any integrity error.
    Verify {
        stream: StreamKind,
    },

    /// Witness daemon commands.
    Witness {
        #[command(subcommand)]
        cmd: WitnessCmd,
    },

    /// Correlate witnesses against executions and print a trust verdict.
    Correlate,
}

#[derive(Subcommand)]
enum WitnessCmd {
    /// Run the witness daemon in the foreground until Ctrl-C.
    Start,
}

#[derive(Copy, Clone, ValueEnum)]
enum StreamKind {
    Ledger,
    Claims,
    Witness,
}

impl StreamKind {
    fn dir_name(self) -> &'static str {
        match self {
            StreamKind::Ledger => "ledger",
            StreamKind::Claims => "claims",
            StreamKind::Witness => "witness",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            StreamKind::Ledger => "agenttrust",
            StreamKind::Claims => "claims",
            StreamKind::Witness => "witness",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let exit_ok = match cli.cmd {
        Commands::Init => cmd_init(&cli.workspace)?,
        Commands::Verify { stream } => cmd_verify(&cli.workspace, stream)?,
        Commands::Witness { cmd: WitnessCmd::Start } => cmd_witness_start(&cli.workspace).await?,
        Commands::Correlate => cmd_correlate(&cli.workspace)?,
    };

    if !exit_ok {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn agenttrust_dir(workspace: &Path) -> PathBuf {
    workspace.join(".agenttrust")
}

/// `agenttrust init`: lays out `.agenttrust/{ledger,claims,witness,digests}`
/// at 0o700 (§6.1). Opening each typed stream is enough to create its
/// directory; `digests/` has no stream of its own so it's created directly.
fn cmd_init(workspace: &Path) -> Result<bool> {
    let root = agenttrust_dir(workspace);

    let _ledger: Stream<ExecutionPayload> = Stream::open(root.join("ledger"), "agenttrust")
        .with_context(|| format!("creating {}", root.join("ledger").display()))?;
    let _claims: Stream<ClaimPayload> = Stream::open(root.join("claims"), "claims")
        .with_context(|| format!("creating {}", root.join("claims").display()))?;
    let _witness: Stream<WitnessPayload> = Stream::open(root.join("witness"), "witness")
        .with_context(|| format!("creating {}", root.join("witness").display()))?;

    at_store::RawStore::new(root.join("digests"), "digest")
        .with_context(|| format!("creating {}", root.join("digests").display()))?;

    info!(workspace = %workspace.display(), "initialized agenttrust workspace");
    println!("initialized {}", root.display());
    Ok(true)
}

/// `agenttrust verify <stream>`: exit 0 on a clean chain, 1 otherwise (§6.5).
fn cmd_verify(workspace: &Path, stream: StreamKind) -> Result<bool> {
    let dir = agenttrust_dir(workspace).join(stream.dir_name());
    let report = match stream {
        StreamKind::Ledger => Stream::<ExecutionPayload>::open(dir, stream.suffix())?.verify()?,
        StreamKind::Claims => Stream::<ClaimPayload>::open(dir, stream.suffix())?.verify()?,
        StreamKind::Witness => Stream::<WitnessPayload>::open(dir, stream.suffix())?.verify()?,
    };

    println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    Ok(report.valid)
}

fn report_json(report: &at_store::IntegrityReport) -> serde_json::Value {
    serde_json::json!({
        "valid": report.valid,
        "filesChecked": report.files_checked,
        "totalEntries": report.total_entries,
        "errors": report.errors.iter().map(|e| serde_json::json!({
            "file": e.file.display().to_string(),
            "line": e.line,
            "kind": format!("{:?}", e.kind),
            "detail": e.detail,
        })).collect::<Vec<_>>(),
    })
}

/// `agenttrust witness start`: runs the daemon in the foreground, flushing
/// batches straight into the witness stream, until Ctrl-C (ground:
/// `mqk-daemon`'s signal handling — there it's an HTTP server loop, here
/// it's a poll loop, but the same "block on the signal future" shape).
async fn cmd_witness_start(workspace: &Path) -> Result<bool> {
    let config_path = workspace.join(".agenttrust").join("config.yaml");
    let workspace_config = at_config::load_config(&config_path);

    if !workspace_config.witness.enabled {
        println!("witness disabled in config, not starting");
        return Ok(true);
    }

    let witness_dir = agenttrust_dir(workspace).join("witness");
    let stream: Stream<WitnessPayload> = Stream::open(witness_dir, "witness")?;

    let daemon_config = at_witness::WitnessDaemonConfig::from(&workspace_config.witness);
    let daemon = at_witness::WitnessDaemon::start(daemon_config, move |batch| {
        for (source, event) in batch {
            let payload = at_witness::to_payload(source, event);
            stream.append(payload)?;
        }
        Ok(())
    });

    info!("witness daemon started, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;

    let mut daemon = daemon;
    daemon.stop(&|_batch| Ok(()));
    info!("witness daemon stopped");
    Ok(true)
}

/// `agenttrust correlate`: reads today's executions and witnesses, runs the
/// full pipeline, and prints the resulting trust verdict as JSON — no table
/// rendering, that's out of scope.
fn cmd_correlate(workspace: &Path) -> Result<bool> {
    let root = agenttrust_dir(workspace);
    let config_path = root.join("config.yaml");
    let workspace_config = at_config::load_config(&config_path);

    let executions: Stream<ExecutionPayload> = Stream::open(root.join("ledger"), "agenttrust")?;
    let claims: Stream<ClaimPayload> = Stream::open(root.join("claims"), "claims")?;
    let witnesses: Stream<WitnessPayload> = Stream::open(root.join("witness"), "witness")?;

    let execution_entries = executions.read(&at_store::ReadFilter::default())?;
    let claim_entries = claims.read(&at_store::ReadFilter::default())?;
    let witness_entries = witnesses.read(&at_store::ReadFilter::default())?;

    let execution_report = executions.verify()?;
    let witness_report = witnesses.verify()?;
    let claim_report = claims.verify()?;

    let correlation = at_correlate::correlate(
        &witness_entries,
        &execution_entries,
        &workspace_config.infrastructure_patterns,
    );
    let consistency = at_consistency::evaluate(&claim_entries, &execution_entries);
    let findings = at_score::build_findings(&witness_entries, &execution_entries, &correlation);
    let witness_confidence = at_score::witness_confidence(
        witness_entries.len(),
        correlation.classification.background_noise.len(),
        correlation.classification.infrastructure_traffic.len(),
        execution_entries.len(),
        &findings,
    );

    let verdict = at_score::compose_verdict(at_score::Components {
        integrity: at_score::integrity_score(&[
            execution_report.valid,
            witness_report.valid,
            claim_report.valid,
        ]),
        consistency: consistency.score,
        witness_confidence,
    });

    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(true)
}
