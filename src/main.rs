#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::style)]

use anyhow::{Context, bail};
use clap::Parser;
use tracing::Level;
use v2sub::cli::Args;
use v2sub::config::ServerConfig;
use v2sub::engine::{build_engine_config, write_engine_config};
use v2sub::subscription::{HttpFetcher, SourcesConfig, SubscriptionService, prompt_server_choice};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let is_verbose = args.verbose;
    tracing_subscriber::fmt()
        .with_max_level(if is_verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let sources_config = match &args.sources_config {
        Some(path) => {
            tracing::info!("Loading sources config from: {}", path);
            SourcesConfig::from_file(path).await?
        }
        None => SourcesConfig::default(),
    };
    let limit = args.limit.unwrap_or(sources_config.limit);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sources_config.output.clone());

    let service = SubscriptionService::new(HttpFetcher::new()?, sources_config.sources);

    let servers = service
        .load_servers(args.input.as_deref(), args.source.unwrap_or(0), limit)
        .await?;

    if servers.is_empty() {
        bail!("Feed contained no usable servers");
    }

    if args.list {
        print_servers(&servers);
        return Ok(());
    }

    let index = if args.pick {
        prompt_server_choice(&servers).context("No server selected")?
    } else {
        args.index
    };
    let server = servers.get(index).with_context(|| {
        format!(
            "Server index {} out of range ({} servers)",
            index,
            servers.len()
        )
    })?;

    tracing::info!(
        "Selected '{}' ({} {})",
        server.display_name,
        server.transport_protocol,
        server.endpoint()
    );

    if output == "-" {
        println!("{}", build_engine_config(server).to_json()?);
    } else {
        write_engine_config(server, &output).await?;
    }

    tracing::info!("Config generation complete!");
    Ok(())
}

fn print_servers(servers: &[ServerConfig]) {
    for (i, server) in servers.iter().enumerate() {
        println!(
            "{:>3}  {:<12} {:<5} {:<4} {}  {}",
            i,
            server.transport_protocol,
            server.stream_type,
            if server.tls_enabled { "tls" } else { "-" },
            server.endpoint(),
            server.display_name
        );
    }
}
