use anyhow::{anyhow, Context, Result};
use crossterm::style::Stylize;
use cx_query::app_paths::AppPaths;
use cx_query::config::config::Config;
use cx_query::display::{print_outcome, Renderer};
use cx_query::logging::{init_tracing, LogRingBuffer, LoggingHandle};
use cx_query::models::{QueryMode, QueryRequest, QuerySubtype};
use cx_query::query_client::QueryClient;
use cx_query::repl::Repl;
use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    api_url: Option<String>,
    mode: Option<QueryMode>,
    subtype: Option<QuerySubtype>,
    query: Option<String>,
    health: bool,
    init_config: bool,
    generate_config: bool,
    help: bool,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value_for = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{} requires a value", flag))
            };
            match arg.as_str() {
                "--api-url" => parsed.api_url = Some(value_for("--api-url")?),
                "--mode" => parsed.mode = Some(value_for("--mode")?.parse()?),
                "--type" => parsed.subtype = Some(value_for("--type")?.parse()?),
                "--query" | "-q" => parsed.query = Some(value_for("--query")?),
                "--health" => parsed.health = true,
                "--init-config" => parsed.init_config = true,
                "--generate-config" => parsed.generate_config = true,
                "--help" | "-h" => parsed.help = true,
                other => return Err(anyhow!("Unknown argument: {} (see --help)", other)),
            }
        }

        Ok(parsed)
    }

    /// Help and config generation finish before any log file is opened
    fn needs_logging(&self) -> bool {
        !(self.help || self.init_config || self.generate_config)
    }
}

fn print_usage() {
    println!("{}", "CX Query - customer experience answer client".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  cx-query [OPTIONS]");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}   - Answer service base URL", "--api-url <URL>".green());
    println!("  {}     - general, policy or complaint", "--mode <MODE>".green());
    println!("  {}     - both, policy or complaint", "--type <TYPE>".green());
    println!("  {}   - Ask one question and exit", "--query <TEXT>".green());
    println!("  {}          - Check backend status and exit", "--health".green());
    println!("  {}     - Initialize configuration with wizard", "--init-config".green());
    println!("  {} - Generate config file with defaults", "--generate-config".green());
    println!();
    println!("Without --query or --health an interactive session starts.");
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&path, Config::create_default_with_comments())
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Configuration file created at: {:?}", path);
    Ok(())
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format!("Could not load config, using defaults: {}", e).yellow());
            tracing::warn!(target: "config", "Falling back to defaults: {}", e);
            Config::default()
        }
    }
}

/// Handle the arguments that never talk to the backend
fn run_offline(args: &CliArgs) -> Result<i32> {
    if args.help {
        print_usage();
    } else if args.init_config {
        Config::init_wizard()?;
    } else if args.generate_config {
        generate_config()?;
    }
    Ok(0)
}

/// Start logging only for runs that reach the backend
fn start_logging(args: &CliArgs, log_dir: impl FnOnce() -> PathBuf) -> Option<LoggingHandle> {
    if !args.needs_logging() {
        return None;
    }
    let logging = init_tracing(Some(&log_dir()));
    if let Some(path) = &logging.log_path {
        tracing::info!(target: "cx_query", "Log file: {}", path.display());
    }
    Some(logging)
}

async fn run(args: CliArgs, logs: LogRingBuffer) -> Result<i32> {
    let mut config = load_config();
    config.api.base_url = config.resolve_api_url(args.api_url.as_deref());
    tracing::info!(target: "config", "Answer service: {}", config.api.base_url);

    let client = QueryClient::from_config(&config);
    let renderer = Renderer::new(config.display.icons.clone());
    let mode = args.mode.unwrap_or_else(|| config.behavior.mode());
    let subtype = args.subtype.unwrap_or_else(|| config.behavior.subtype());

    if args.health {
        let status = client.check_health().await;
        println!("{}", renderer.render_health(&status));
        return Ok(if status.is_online() { 0 } else { 1 });
    }

    if let Some(text) = args.query {
        let mut client = client;
        let outcome = client
            .submit_query(QueryRequest::new(text, mode, subtype))
            .await;
        print_outcome(&renderer, &outcome);
        return Ok(if outcome.is_error() { 1 } else { 0 });
    }

    Repl::new(client, renderer)
        .with_defaults(mode, subtype)
        .with_logs(logs)
        .run()
        .await?;
    Ok(0)
}

#[tokio::main]
async fn main() {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", format!("{:#}", e).red());
            std::process::exit(2);
        }
    };

    let result = match start_logging(&args, AppPaths::log_dir) {
        Some(logging) => run(args, logging.buffer).await,
        None => run_offline(&args),
    };

    let code = result.unwrap_or_else(|e| {
        eprintln!("{}", format!("Error: {:#}", e).red());
        1
    });
    std::process::exit(code);
}
