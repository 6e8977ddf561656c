//! ScaleLib CLI - scheduler node inspection and singleton locking
//!
//! Mirrors what an autoscaler entry point does: take the singleton lock,
//! build scheduler nodes, group them, release the lock.

use anyhow::{Context, Result};
use clap::Parser;
use scalelib::config::{default_lock_path, parse_resource, AutoscaleConfig, CliArgs, Commands};
use scalelib::ident::IncrementingUuid;
use scalelib::lock::new_singleton_lock;
use scalelib::node::{NodeContext, Resources, SchedulerNode};
use scalelib::partition::partition;
use serde_json::{Map, Value};
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging; stdout is reserved for command output
    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => AutoscaleConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AutoscaleConfig::default(),
    };

    match args.command {
        Commands::Nodes {
            hostnames,
            bucket,
            resources,
            no_dns,
            deterministic_ids,
        } => cmd_nodes(&config, hostnames, bucket, &resources, no_dns, deterministic_ids),
        Commands::Lock { hold_secs } => cmd_lock(&config, hold_secs),
        Commands::LockPath => cmd_lock_path(&config),
    }
}

fn cmd_nodes(
    config: &AutoscaleConfig,
    hostnames: Vec<String>,
    bucket: Option<String>,
    resource_args: &[String],
    no_dns: bool,
    deterministic_ids: bool,
) -> Result<()> {
    let mut lock = new_singleton_lock(config)?;

    let hostnames = if hostnames.is_empty() {
        let local = hostname::get().context("reading local hostname")?;
        vec![local.to_string_lossy().into_owned()]
    } else {
        hostnames
    };

    let mut resources = Resources::new();
    for arg in resource_args {
        let (key, value) = parse_resource(arg)?;
        resources.insert(key, value);
    }

    let mut ctx = if no_dns {
        NodeContext::hermetic()
    } else {
        NodeContext::default()
    };
    if deterministic_ids {
        ctx = ctx.with_id_generator(IncrementingUuid::new());
    }

    let mut nodes = hostnames
        .iter()
        .map(|hostname| {
            SchedulerNode::with_context(&ctx, hostname, Some(resources.clone()), bucket.as_deref())
        })
        .collect::<scalelib::Result<Vec<_>>>()?;
    nodes.sort();
    info!(count = nodes.len(), "Built scheduler nodes");

    let by_bucket = partition(nodes, |node| node.bucket_id().to_string());
    let mut report = Map::new();
    for (bucket_id, group) in by_bucket {
        let snapshots = group.iter().map(|n| Value::Object(n.to_dict())).collect();
        report.insert(bucket_id, Value::Array(snapshots));
    }
    println!("{}", serde_json::to_string_pretty(&Value::Object(report))?);

    lock.unlock()?;
    Ok(())
}

fn cmd_lock(config: &AutoscaleConfig, hold_secs: u64) -> Result<()> {
    let mut lock = new_singleton_lock(config)?;

    match lock.lock_path() {
        Some(path) => println!("{} {}", path.display(), std::process::id()),
        None => println!("locking disabled"),
    }

    if hold_secs > 0 {
        thread::sleep(Duration::from_secs(hold_secs));
    }

    lock.unlock()?;
    Ok(())
}

fn cmd_lock_path(config: &AutoscaleConfig) -> Result<()> {
    match config.lock_path()? {
        Some(path) => println!("{}", path.display()),
        None => println!("locking disabled (default would be {})", default_lock_path()?.display()),
    }
    Ok(())
}
