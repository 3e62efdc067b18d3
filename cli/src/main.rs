mod cluster;
mod commands;
mod config;
mod infra;

use crate::config::Config;
use anyhow::Result;
use clap::Parser;
use dbeerer_scenarios::ScenarioError;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    if let Err(err) = init_tracing(&config) {
        eprintln!("internal error: failed initializing logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match commands::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if is_internal(&err) {
                eprintln!("internal error: {err:#}");
            } else {
                eprintln!("❌ {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &Config) -> Result<()> {
    let mut filter = EnvFilter::builder()
        .with_default_directive(config.log_level().into())
        .from_env()?;
    if config.log_level() == tracing::level_filters::LevelFilter::DEBUG {
        filter = filter
            .add_directive("dbeerer=debug".parse()?)
            .add_directive("dbeerer_scenarios=debug".parse()?);
    }

    tracing_subscriber::registry()
        .with(fmt::layer().without_time().with_target(false))
        .with(filter)
        .init();

    Ok(())
}

/// Transport, local I/O and serialization failures, as opposed to errors the
/// user can act on.
fn is_internal(err: &anyhow::Error) -> bool {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<ScenarioError>() {
            return !err.is_user_facing();
        }
        if cause.is::<kube::Error>() || cause.is::<std::io::Error>() || cause.is::<reqwest::Error>()
        {
            return true;
        }
    }
    false
}
