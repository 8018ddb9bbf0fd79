mod cli;

use std::fs;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pgdescribe::connect::{self, ConnectionConfig};
use pgdescribe::describe;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ConnectionConfig::parse(&cli.url)?;
    let resource = cli.resource(config.database())?;
    let options = cli.describe_options();

    tracing::info!("Describing {}", resource.uri());

    let executor = connect::connect(&config, &resource.database, cli.concurrency).await?;
    let report = describe::describe(&executor, &resource.database, resource.kind, &options).await;
    executor.close().await;
    let report = report?;

    let output = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };

    match cli.outfile {
        Some(ref path) => {
            fs::write(path, format!("{output}\n"))?;
            tracing::info!("Output written to {path}");
        }
        None => {
            println!("{output}");
        }
    }

    Ok(())
}
