mod gain;

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use toktrim::config;
use toktrim::engine::Engine;
use toktrim::output;
use toktrim::paths;
use toktrim::pipeline::{InvocationContext, Pipeline, Processed};
use toktrim::session;

#[derive(Parser)]
#[command(
    name = "toktrim",
    version,
    about = "Shrink developer-tool output before it reaches an LLM context"
)]
struct Cli {
    /// Show how long filtering took
    #[arg(long, global = true)]
    timing: bool,

    /// Report the technique chain and savings on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the discovered one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where the text came from. Exactly one is required.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct OriginArgs {
    /// Shell command that produced the output
    #[arg(long)]
    command: Option<String>,
    /// Path of the file whose contents are being read
    #[arg(long)]
    file: Option<String>,
}

impl OriginArgs {
    fn context(&self, tool: Option<&str>, session_id: &str) -> InvocationContext {
        match (&self.command, &self.file) {
            (Some(command), _) => {
                InvocationContext::shell(tool.unwrap_or("bash"), command, session_id)
            }
            (None, Some(path)) => {
                InvocationContext::file_read(tool.unwrap_or("read"), path, session_id)
            }
            (None, None) => InvocationContext::shell(tool.unwrap_or("bash"), "", session_id),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Filter tool output read from stdin
    Filter {
        #[command(flatten)]
        origin: OriginArgs,
        /// Name of the tool that produced the output
        #[arg(long)]
        tool: Option<String>,
        /// Session the invocation belongs to
        #[arg(long, env = "TOKTRIM_SESSION", default_value = "default")]
        session: String,
    },
    /// Apply the pipeline to a fixture file without recording metrics
    Test {
        /// Path to the fixture file
        fixture_path: PathBuf,
        #[command(flatten)]
        origin: OriginArgs,
    },
    /// Show savings statistics from the metrics log
    Gain {
        /// Only this session
        #[arg(long)]
        session: Option<String>,
        /// One summary per session
        #[arg(long)]
        by_session: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

fn report(processed: &Processed, elapsed: std::time::Duration, cli: &Cli) {
    if cli.timing {
        eprintln!(
            "[toktrim] filter took {:.1}ms",
            elapsed.as_secs_f64() * 1000.0
        );
    }
    if !cli.verbose {
        return;
    }
    match &processed.record {
        Some(record) => eprintln!(
            "[toktrim] {}: {} -> {} chars ({:.1}% saved)",
            record.technique, record.original_chars, record.filtered_chars, record.savings_percent
        ),
        None => eprintln!("[toktrim] no filter changed the output"),
    }
}

fn read_stdin() -> anyhow::Result<String> {
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .context("read stdin")?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn cmd_filter(
    origin: &OriginArgs,
    tool: Option<&str>,
    session_id: &str,
    cli: &Cli,
) -> anyhow::Result<i32> {
    let raw = read_stdin()?;
    let engine = Engine::new(config::load(cli.config.as_deref()));

    let state_file = paths::sessions_dir().map(|dir| session::state_path(&dir, session_id));
    // Held until the snapshot is saved so concurrent turns of one session
    // serialize their read-modify-write.
    let _state_lock = state_file.as_deref().and_then(|path| {
        session::lock_state(path)
            .inspect_err(|e| tracing::warn!("session state not locked: {e:#}"))
            .ok()
    });
    if let Some(path) = &state_file {
        engine
            .sessions()
            .insert(session_id, session::load_state(path));
    }

    let ctx = origin.context(tool, session_id);
    let start = Instant::now();
    let handled = engine.handle(&ctx, &raw);
    let elapsed = start.elapsed();

    if let Some(path) = &state_file
        && let Some(state) = engine.sessions().get(session_id)
        && let Err(e) = session::save_state(path, &state)
    {
        tracing::warn!("session state not saved: {e:#}");
    }

    output::print_output(&handled.processed.output);
    report(&handled.processed, elapsed, cli);
    if let Some(note) = handled.notification {
        eprintln!("[toktrim] {note}");
    }
    Ok(0)
}

fn cmd_test(fixture_path: &Path, origin: &OriginArgs, cli: &Cli) -> anyhow::Result<i32> {
    let fixture = std::fs::read_to_string(fixture_path)
        .with_context(|| format!("failed to read fixture: {}", fixture_path.display()))?;
    let pipeline = Pipeline::new(config::load(cli.config.as_deref()));
    let ctx = origin.context(None, "test");

    let start = Instant::now();
    let processed = pipeline.process(&ctx, &fixture);
    let elapsed = start.elapsed();

    output::print_output(&processed.output);
    report(&processed, elapsed, cli);
    Ok(0)
}

fn cmd_config(json: bool, cli: &Cli) -> anyhow::Result<i32> {
    let cfg = config::load(cli.config.as_deref());
    if json {
        output::print_json(&cfg);
    } else {
        print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    }
    Ok(0)
}

fn or_exit(r: anyhow::Result<i32>) -> i32 {
    r.unwrap_or_else(|e| {
        eprintln!("[toktrim] error: {e:#}");
        1
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TOKTRIM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match &cli.command {
        Commands::Filter {
            origin,
            tool,
            session,
        } => or_exit(cmd_filter(origin, tool.as_deref(), session, &cli)),
        Commands::Test {
            fixture_path,
            origin,
        } => or_exit(cmd_test(fixture_path, origin, &cli)),
        Commands::Gain {
            session,
            by_session,
            json,
        } => gain::cmd_gain(session.as_deref(), *by_session, *json, cli.config.as_deref()),
        Commands::Config { json } => or_exit(cmd_config(*json, &cli)),
    };
    std::process::exit(exit_code);
}
