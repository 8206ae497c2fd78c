//! Stage mock Prometheus CLI
//!
//! Serve the mock backend over HTTP, or inspect scenarios offline on a
//! virtual clock.

use anyhow::{anyhow, Context};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use stage_core::scenario::list_scenarios;
use stage_core::{QueryResponse, ScenarioEngine, ScenarioKind};
use stage_env::{ManualClock, StageConfig, SystemClock};
use stage_sim::{server, TimelineExport, TimelineRunner};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Stage mock Prometheus backend
#[derive(Parser, Debug)]
#[command(name = "stage-sim")]
#[command(about = "Synthetic Prometheus metrics for demos and verification", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the mock backend over HTTP
    Serve(ServeArgs),

    /// List available scenarios
    Scenarios,

    /// Play a scenario on a virtual clock and check its invariants
    Timeline(TimelineArgs),

    /// Evaluate one query at a given elapsed time
    Query {
        /// Query text, e.g. 'histogram_quantile(0.99, rate(http_request_duration_seconds_bucket[5m]))'
        query: String,

        #[command(flatten)]
        at: AtArgs,
    },

    /// Print the /metrics exposition at a given elapsed time
    Metrics {
        #[command(flatten)]
        at: AtArgs,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Mount the mock Prometheus routes (true/false, 1/0, yes/no, on/off)
    #[arg(
        long,
        env = "PROMETHEUS_ENABLED",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    prometheus_enabled: bool,

    /// Scenario active at startup (unknown names fall back to healthy)
    #[arg(short = 'S', long, env = "STAGE_PROMETHEUS_SCENARIO", default_value = "healthy")]
    scenario: String,
}

impl From<ServeArgs> for StageConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            prometheus_enabled: args.prometheus_enabled,
            initial_scenario: args.scenario,
        }
    }
}

#[derive(Args, Debug)]
struct TimelineArgs {
    /// Scenario to play (healthy, high-errors, latency-spike, gradual-degradation)
    #[arg(short = 'S', long)]
    scenario: ScenarioKind,

    /// Seconds between samples
    #[arg(long, default_value = "30")]
    step_secs: u64,

    /// Total seconds to cover (defaults to the longest ramp plus one minute)
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Query to evaluate at every step (repeatable)
    #[arg(short, long = "query")]
    queries: Vec<String>,

    /// Export the timeline to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Print the timeline as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct AtArgs {
    /// Scenario to evaluate against
    #[arg(short = 'S', long, default_value = "healthy")]
    scenario: ScenarioKind,

    /// Seconds since the scenario started
    #[arg(long, default_value = "0")]
    at_secs: u64,
}

impl AtArgs {
    /// Builds an engine on a virtual clock already advanced to `at_secs`.
    fn engine(&self) -> ScenarioEngine {
        let clock = ManualClock::new();
        let engine = ScenarioEngine::with_scenario(Arc::new(clock.clone()), self.scenario);
        clock.advance(Duration::from_secs(self.at_secs));
        engine
    }
}

fn init_logging(verbose: bool, json: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow!("Failed to set tracing subscriber: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs)?;

    match cli.command {
        Command::Serve(args) => serve(args.into()).await,
        Command::Scenarios => {
            for summary in list_scenarios() {
                println!("{:<20} {}", summary.name.name(), summary.description);
            }
            Ok(())
        }
        Command::Timeline(args) => timeline(args),
        Command::Query { query, at } => {
            let engine = at.engine();
            let response = QueryResponse::from_result(engine.evaluate_query(&query));
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Metrics { at } => {
            print!("{}", at.engine().render_exposition());
            Ok(())
        }
    }
}

async fn serve(config: StageConfig) -> anyhow::Result<()> {
    config.validate()?;
    info!("Stage mock Prometheus v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: host={} port={} prometheus_enabled={} scenario={}",
        config.host, config.port, config.prometheus_enabled, config.initial_scenario
    );

    let engine = Arc::new(ScenarioEngine::new(
        SystemClock::shared(),
        &config.initial_scenario,
    ));
    server::serve(&config, engine)
        .await
        .context("server error")
}

fn timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let mut runner = TimelineRunner::new(args.scenario)
        .with_step(Duration::from_secs(args.step_secs))
        .with_queries(args.queries);
    if let Some(secs) = args.duration_secs {
        runner = runner.with_duration(Duration::from_secs(secs));
    }

    let result = runner.run();
    let passed = result.passed();
    let export = TimelineExport::new(result);

    if let Some(path) = &args.export {
        export
            .write_to_file(path)
            .with_context(|| format!("Failed to write export to {}", path))?;
        info!("Exported {} samples to {}", export.timeline.samples.len(), path);
    }

    if args.json {
        println!("{}", export.to_json()?);
    } else {
        println!("{:>10}  {:>10}  {:>12}  {:>3}", "elapsed", "errors %", "latency ms", "up");
        for sample in &export.timeline.samples {
            let m = &sample.metrics;
            println!(
                "{:>10}  {:>10.3}  {:>12.1}  {:>3}",
                sample.elapsed, m.error_rate, m.latency, m.up
            );
            for outcome in &sample.queries {
                match (&outcome.value, &outcome.error) {
                    (Some(v), _) => println!("{:>10}  {} = {:.6}", "", outcome.query, v),
                    (None, Some(e)) => println!("{:>10}  {} ! {}", "", outcome.query, e),
                    (None, None) => {}
                }
            }
        }
    }

    if passed {
        info!("✓ {} timeline passed", args.scenario);
        Ok(())
    } else {
        for violation in &export.timeline.violations {
            error!("  - {}", violation);
        }
        error!("✗ {} timeline failed", args.scenario);
        std::process::exit(1);
    }
}
