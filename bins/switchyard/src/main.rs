mod wire;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use switchyard_api::record::Record;
use switchyard_engine::{EngineError, PipelineConfig, Registry, TransformChain};

use crate::wire::WireRecord;

#[derive(Parser)]
#[command(name = "switchyard", about = "Record transform chain driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a configured chain to NDJSON records read from stdin.
    Run {
        /// Path to TOML pipeline configuration.
        #[arg(long, default_value = "pipeline.toml", env = "SWITCHYARD_CONFIG")]
        config: String,
    },
    /// Print the options a unit kind accepts.
    Describe {
        /// Unit kind, e.g. `regex-router`. Omit to list all kinds.
        kind: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // stdout carries records; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let registry = Registry::builtin();

    let result = match cli.command {
        Command::Run { config } => run(&config, &registry).await,
        Command::Describe { kind } => describe(kind.as_deref(), &registry),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "switchyard failed");
        std::process::exit(1);
    }
}

async fn run(config_path: &str, registry: &Registry) -> Result<(), EngineError> {
    tracing::info!(config = %config_path, "loading configuration");
    let config = PipelineConfig::load(config_path)?;
    let chain = TransformChain::from_config(&config, registry)?;
    tracing::info!(stages = ?chain.names(), "chain ready, reading records from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let (mut seen, mut failed) = (0u64, 0u64);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                seen += 1;
                match process_line(&chain, &line) {
                    Ok(out) => {
                        stdout.write_all(out.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                    }
                    Err(e) => {
                        failed += 1;
                        tracing::warn!(line = seen, error = %e, "record skipped");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down...");
                break;
            }
        }
    }

    stdout.flush().await?;
    tracing::info!(records = seen, skipped = failed, "done");
    Ok(())
}

fn process_line(chain: &TransformChain, line: &str) -> Result<String, EngineError> {
    let wire: WireRecord = serde_json::from_str(line)
        .map_err(|e| EngineError::Record(format!("malformed record: {e}")))?;
    let out = chain.apply(&Record::from(wire))?;
    serde_json::to_string(&WireRecord::from(&out))
        .map_err(|e| EngineError::Record(format!("unserializable record: {e}")))
}

fn describe(kind: Option<&str>, registry: &Registry) -> Result<(), EngineError> {
    let Some(kind) = kind else {
        for (name, unit) in registry.kinds() {
            println!("{name:<24} {unit}");
        }
        return Ok(());
    };

    let params = registry.describe(kind)?;
    println!(
        "{:<18} {:<8} {:<10} {:<9} {:<8} DESCRIPTION",
        "NAME", "TYPE", "IMPORTANCE", "REQUIRED", "DEFAULT"
    );
    for p in params {
        let default = p.default.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<18} {:<8} {:<10} {:<9} {:<8} {}",
            p.name,
            p.param_type.to_string(),
            p.importance.to_string(),
            if p.required { "yes" } else { "no" },
            default,
            p.description
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_chain() -> TransformChain {
        TransformChain::from_config(&PipelineConfig::default(), &Registry::builtin()).unwrap()
    }

    #[test]
    fn test_malformed_line_is_record_error() {
        let err = process_line(&identity_chain(), "{not json").unwrap_err();
        assert!(matches!(err, EngineError::Record(_)));

        let err = process_line(&identity_chain(), r#"{"value": {}}"#).unwrap_err();
        assert!(matches!(err, EngineError::Record(_)));
    }

    #[test]
    fn test_line_round_trips_through_empty_chain() {
        let line = r#"{"destination":"t","partition":1,"key":null,"value":{"a":1}}"#;
        assert_eq!(process_line(&identity_chain(), line).unwrap(), line);
    }
}
