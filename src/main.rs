use anyhow::Context;
use rssant_config::config::{EnvironmentBinder, FieldDefault, SCHEMA};
use rssant_config::shared::LoggingUtils;
use rssant_config::AppConfig;
use tracing::info;

fn main() {
    if let Err(e) = run() {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--list-vars") {
        list_vars();
        return Ok(());
    }
    let check_only = args.iter().any(|arg| arg == "--check");

    let log_filter = LoggingUtils::initialize("info").context("Failed to initialize logging")?;

    info!("Resolving configuration...");
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            LoggingUtils::log_failure(&e);
            return Err(e).context("Invalid configuration");
        }
    };
    log_filter
        .set_level(config.log_level.as_filter())
        .context("Failed to apply log level")?;
    LoggingUtils::log_resolved(&config);

    if !check_only {
        println!("{}", config.to_redacted_json()?);
    }

    Ok(())
}

/// Print every recognized variable with its default
fn list_vars() {
    let binder = EnvironmentBinder::default();
    println!("{}\tpath of an env-file to preload", binder.env_file_key());
    for spec in SCHEMA {
        let default = match spec.default {
            FieldDefault::Value(_) if spec.secret => "<secret>".to_string(),
            FieldDefault::Value(value) => value.to_string(),
            FieldDefault::Optional => "(optional)".to_string(),
            FieldDefault::Required => "(required)".to_string(),
        };
        println!(
            "{}\t{}\t{}\t{}",
            binder.env_key(spec.name),
            spec.kind.expected(),
            default,
            spec.description
        );
    }
}
