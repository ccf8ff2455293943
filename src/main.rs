use registrator::cli::CliArgs;
use registrator::engine::{EventLoop, Reconciler};
use registrator::registry::{ConsulRegistry, ServiceRegistry};
use registrator::runtime::{ContainerRuntime, DockerRuntime};
use registrator::util::logging::{init_logging, parse_level, LoggingConfig};
use registrator::util::shutdown_signal;
use registrator::{RegistratorConfig, VERSION};

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let config = RegistratorConfig::default();
    init_logging_from_args(&args, &config);

    let exit_code = match run(config).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run(config: RegistratorConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    let shutdown = shutdown_signal();

    info!(
        node_ip = %config.node_ip,
        hostname = %config.hostname,
        consul = %config.consul_url,
        "registrator v{} starting",
        VERSION
    );
    debug!("{}", config);

    let runtime = Arc::new(DockerRuntime::connect().context("Failed to create Docker client")?);
    match runtime.api_version().await {
        Ok(version) => debug!("Docker API version: {}", version),
        Err(e) => warn!("Docker daemon not responding yet: {}", e),
    }

    let registry = Arc::new(
        ConsulRegistry::new(&config.consul_url, config.request_timeout())
            .context("Failed to create Consul client")?,
    );
    match registry.agent_name().await {
        Ok(node) => info!("Connected to Consul agent on node {}", node),
        Err(e) => warn!("Consul is not reachable ({}), continuing anyway", e),
    }

    info!(
        "Syncing {} containers into {}",
        runtime.name(),
        registry.name()
    );

    let reconciler = Arc::new(Reconciler::new(
        runtime.clone(),
        registry,
        config.engine_settings(),
    ));

    reconciler.bootstrap().await;

    EventLoop::new(reconciler)
        .run(runtime.events(), shutdown)
        .await
        .context("Container event subscription lost")?;

    info!("Stopped");
    Ok(())
}

fn init_logging_from_args(args: &CliArgs, config: &RegistratorConfig) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        parse_level(&config.log_level)
    };

    init_logging(LoggingConfig {
        level,
        use_json: args.json_logs || config.log_json,
        ..Default::default()
    });
}
