use anyhow::{Context, Result};
use clap::Parser;
use latencia::cli::{Cli, Command, DataArgs, QueryArgs, ServeArgs};
use latencia::config::Settings;
use latencia::engine::MetricsEngine;
use latencia::loader::DatasetLoader;
use latencia::output;
use latencia::request::{MetricsRequest, DEFAULT_THRESHOLD_MS};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber on stderr
///
/// `--debug` forces TRACE; otherwise `RUST_LOG` applies, defaulting to warnings.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Settings file (if any) with defaults for everything unset
fn load_settings(cli: &Cli) -> Result<Settings> {
    match &cli.config {
        Some(path) => Settings::from_toml(path),
        None => Ok(Settings::default()),
    }
}

fn build_engine(settings: &Settings) -> Result<MetricsEngine> {
    settings.validate().map_err(anyhow::Error::msg)?;
    Ok(MetricsEngine::new(
        DatasetLoader::new(settings.loader_config()),
        settings.resolver()?,
    ))
}

/// Request from `--request FILE`, or from `--region`/`--threshold`
fn build_request(args: &QueryArgs) -> Result<MetricsRequest> {
    if let Some(path) = &args.request {
        let body = std::fs::read(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?;
        return Ok(MetricsRequest::from_json(&body)?);
    }

    if args.regions.is_empty() {
        anyhow::bail!("No regions requested. Usage: latencia query -r REGION [-r REGION ...] [-t MS]");
    }
    let request = MetricsRequest::new(
        args.regions.iter().cloned(),
        args.threshold_ms.unwrap_or(DEFAULT_THRESHOLD_MS),
    );
    request.validate()?;
    Ok(request)
}

fn run_query(mut settings: Settings, args: &QueryArgs) -> Result<()> {
    args.source.apply(&mut settings);
    let engine = build_engine(&settings)?;
    let request = build_request(args)?;

    let report = engine.compute(&request)?;
    println!("{}", output::render(&report, args.format)?);
    Ok(())
}

fn run_schema(mut settings: Settings, args: &DataArgs) -> Result<()> {
    args.apply(&mut settings);
    let engine = build_engine(&settings)?;

    let (schema, records) = engine.inspect()?;
    println!("source:  {}", settings.data.path.display());
    println!("records: {}", records);
    println!("{}", schema);
    Ok(())
}

#[cfg(feature = "server")]
fn run_serve(mut settings: Settings, args: &ServeArgs) -> Result<()> {
    use latencia::server::{self, MetricsService};

    args.apply(&mut settings);
    let engine = build_engine(&settings)?;
    let addr = settings.listen_addr()?;
    let service = MetricsService::new(engine, settings.server.route.clone());

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(server::run(addr, service))
}

#[cfg(not(feature = "server"))]
fn run_serve(_settings: Settings, _args: &ServeArgs) -> Result<()> {
    anyhow::bail!("latencia was built without the `server` feature")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing before anything touches the telemetry source
    init_tracing(cli.debug);

    let settings = load_settings(&cli)?;

    match &cli.command {
        Command::Query(args) => run_query(settings, args),
        Command::Schema(args) => run_schema(settings, args),
        Command::Serve(args) => run_serve(settings, args),
    }
}
