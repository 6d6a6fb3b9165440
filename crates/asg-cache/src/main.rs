//! asg-cache: inspect Auto Scaling groups the way the autoscaler sees them

use anyhow::{Result, bail};
use asg_cache::aws::{AutoScalingClient, AwsContext};
use asg_cache::config::ResolverConfig;
use asg_cache::metrics::QueryStats;
use asg_cache::{GroupRegistry, GroupSource, LaunchConfigCache, Provider, ResolvedGroup};
use asg_cache_common::defaults::{DEFAULT_REGION, DEFAULT_THROTTLE_RETRY_DELAY_MS};
use asg_cache_common::number_of_local_volumes;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "asg-cache")]
#[command(about = "Auto Scaling group discovery and launch configuration lookup")]
#[command(version)]
struct Args {
    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long, global = true)]
    aws_profile: Option<String>,

    /// JSON config file; its settings replace region, profile and groups
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Delay before retrying a throttled request, in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_THROTTLE_RETRY_DELAY_MS)]
    throttle_retry_delay_ms: u64,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Describe explicitly named groups (`<min>:<max>:<name>`)
    Describe {
        /// Group spec, may be repeated
        #[arg(long = "group")]
        groups: Vec<String>,
    },

    /// Discover groups by tag (`asg:tag=<key>[=<value>],...`)
    Discover {
        /// Auto-discovery spec, may be repeated
        #[arg(long = "auto-discovery")]
        specs: Vec<String>,
    },

    /// Look up the instance type of a launch configuration
    InstanceType {
        /// Launch configuration name
        name: String,
    },

    /// Print the number of local instance-store volumes for an instance type
    LocalVolumes {
        /// EC2 instance type (e.g., "c5d.xlarge")
        instance_type: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(std::env::var("RUST_LOG").ok().as_deref())?)
        .init();

    if let Command::LocalVolumes { instance_type } = &args.command {
        let volumes = number_of_local_volumes(instance_type);
        match args.format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "instance_type": instance_type, "local_volumes": volumes })
            ),
            OutputFormat::Table => println!("{instance_type}: {volumes}"),
        }
        return Ok(());
    }

    let config = resolve_config(&args)?;
    debug!(?config, "Resolved configuration");

    if let Some(profile) = &config.aws_profile {
        info!(profile = %profile, "Using AWS profile");
    }
    let aws = AwsContext::with_profile(&config.region, config.aws_profile.as_deref()).await;
    let stats = Arc::new(QueryStats::new());
    let provider = Provider::new(AutoScalingClient::from_context(&aws))
        .with_observer(stats.clone())
        .with_throttle_retry_delay(config.throttle_retry_delay());

    match &args.command {
        Command::Describe { .. } | Command::Discover { .. } => {
            let source = config.group_source()?;
            check_source(&args.command, &source)?;

            let registry = GroupRegistry::new(provider);
            let groups = registry.refresh(&source).await?;
            print_groups(&groups, args.format)?;
        }

        Command::InstanceType { name } => {
            let cache = LaunchConfigCache::new(provider);
            let instance_type = cache.lookup(name).await?;
            match args.format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "launch_configuration": name, "instance_type": instance_type })
                ),
                OutputFormat::Table => println!("{name}: {instance_type}"),
            }
        }

        Command::LocalVolumes { .. } => {}
    }

    for (operation, op) in stats.snapshot() {
        debug!(
            operation = %operation,
            calls = op.calls,
            errors = op.errors,
            throttled = op.throttled,
            elapsed_ms = op.total_duration.as_millis() as u64,
            "Provider usage"
        );
    }

    Ok(())
}

/// Log filter from `RUST_LOG`, defaulting to INFO when unset. AWS SDK
/// targets stay at WARN either way.
fn env_filter(rust_log: Option<&str>) -> Result<EnvFilter> {
    let filter = match rust_log.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::new("info"),
    };
    Ok(filter
        .add_directive("aws_config=warn".parse()?)
        .add_directive("aws_sdk_autoscaling=warn".parse()?)
        .add_directive("aws_smithy_runtime=warn".parse()?))
}

/// Build the resolver config from `--config` or the global flags.
///
/// Subcommand group flags, when given, replace the groups of either source.
fn resolve_config(args: &Args) -> Result<ResolverConfig> {
    let mut config = match &args.config {
        Some(path) => ResolverConfig::load(path)?,
        None => ResolverConfig {
            region: args.region.clone(),
            aws_profile: args.aws_profile.clone(),
            throttle_retry_delay_ms: args.throttle_retry_delay_ms,
            ..Default::default()
        },
    };
    match &args.command {
        Command::Describe { groups } if !groups.is_empty() => {
            config.groups = groups.clone();
            config.auto_discovery.clear();
        }
        Command::Discover { specs } if !specs.is_empty() => {
            config.auto_discovery = specs.clone();
            config.groups.clear();
        }
        _ => {}
    }
    Ok(config)
}

fn check_source(command: &Command, source: &GroupSource) -> Result<()> {
    match (command, source) {
        (Command::Describe { .. }, GroupSource::AutoDiscovery(_)) => {
            bail!("describe needs explicit groups, use discover for auto-discovery specs")
        }
        (Command::Discover { .. }, GroupSource::Explicit(_)) => {
            bail!("discover needs auto-discovery specs, use describe for named groups")
        }
        _ => Ok(()),
    }
}

fn print_groups(groups: &[ResolvedGroup], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("No auto scaling groups found.");
        return Ok(());
    }

    println!(
        "{:<40} {:>5} {:>5} {:<30} {:<15}",
        "NAME", "MIN", "MAX", "LAUNCH_CONFIGURATION", "INSTANCE_TYPE"
    );
    println!("{}", "-".repeat(99));
    for g in groups {
        println!(
            "{:<40} {:>5} {:>5} {:<30} {:<15}",
            g.descriptor.name,
            g.descriptor.min_size,
            g.descriptor.max_size,
            g.launch_configuration_name.as_deref().unwrap_or("-"),
            g.instance_type.as_deref().unwrap_or("-"),
        );
    }
    println!("\nTotal: {} groups", groups.len());

    Ok(())
}
