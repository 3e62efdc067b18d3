mod cleanup;
mod crds;
mod infra;
mod scenario;
mod status;

use crate::cluster::Cluster;
use crate::config::{Command, Config, InfraCommand};
use anyhow::Result;

pub async fn run(config: Config) -> Result<()> {
    match &config.command {
        Command::Crds => crds::print(),
        Command::Infra(InfraCommand::Deploy) => {
            crate::infra::deploy(config.playground_repository()).await
        }
        Command::Infra(InfraCommand::Status) => {
            let cluster = Cluster::connect(&config).await?;
            infra::status(&cluster).await
        }
        Command::List => {
            let controller = Cluster::connect(&config).await?.controller(&config)?;
            scenario::list(&controller).await
        }
        Command::Start { scenario_id, force } => {
            let controller = Cluster::connect(&config).await?.controller(&config)?;
            scenario::start(&controller, scenario_id, *force).await
        }
        Command::Stop => {
            let controller = Cluster::connect(&config).await?.controller(&config)?;
            scenario::stop(&controller).await
        }
        Command::Status => {
            let cluster = Cluster::connect(&config).await?;
            let client = cluster.client.clone();
            let controller = cluster.controller(&config)?;
            status::show(&controller, &client).await
        }
        Command::Cleanup { keep_infra } => {
            let controller = Cluster::connect(&config).await?.controller(&config)?;
            cleanup::run(&controller, *keep_infra).await
        }
    }
}
