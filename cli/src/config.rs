use clap::{Parser, Subcommand};
use dbeerer_scenarios::config::{CatalogConfig, ChartSourceConfig, HelmConfig};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// DevOpsBeerer: deploys the playground infrastructure and manages OIDC/OAuth2
/// scenarios on it.
#[derive(Debug, Parser)]
#[clap(name = "dbeerer", version)]
pub struct Config {
    /// Turn debug logs on
    #[clap(long, global = true)]
    debug: bool,

    /// Kubeconfig of the playground cluster. Falls back to the in-cluster or
    /// default configuration when the file doesn't exist.
    #[clap(
        long,
        env = "KUBECONFIG",
        default_value = "/etc/rancher/k3s/k3s.yaml"
    )]
    kubeconfig: PathBuf,

    #[clap(long, env = "DBEERER_HTTP_TIMEOUT", default_value = "30s")]
    http_timeout: humantime::Duration,

    /// Repository holding the infrastructure install scripts
    #[clap(
        long,
        env = "DBEERER_PLAYGROUND_REPOSITORY",
        default_value = "https://github.com/DevOpsBeerer/playground.git"
    )]
    playground_repository: String,

    #[clap(flatten)]
    pub catalog: CatalogConfig,

    #[clap(flatten)]
    pub charts: ChartSourceConfig,

    #[clap(flatten)]
    pub helm: HelmConfig,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List available scenarios
    List,

    /// Start a scenario, replacing the active one
    Start {
        scenario_id: String,

        /// Reinstall a scenario left behind by an interrupted start
        #[clap(long)]
        force: bool,
    },

    /// Stop the active scenario
    Stop,

    /// Show the active scenario and infrastructure health
    Status,

    /// Remove the active scenario and the infrastructure
    Cleanup {
        /// Keep infrastructure running
        #[clap(long, short = 'k')]
        keep_infra: bool,
    },

    /// Deploy or inspect the playground infrastructure
    #[clap(subcommand)]
    Infra(InfraCommand),

    /// Print the CustomResourceDefinitions used by dbeerer
    Crds,
}

#[derive(Debug, Subcommand)]
pub enum InfraCommand {
    /// Install K3s with cert-manager, ingress-nginx and Keycloak
    Deploy,

    /// Check the infrastructure components
    Status,
}

impl Config {
    pub fn log_level(&self) -> LevelFilter {
        match self.debug {
            true => LevelFilter::DEBUG,
            false => LevelFilter::INFO,
        }
    }

    pub fn kubeconfig(&self) -> &Path {
        &self.kubeconfig
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        self.http_timeout.into()
    }

    pub fn playground_repository(&self) -> &str {
        &self.playground_repository
    }
}

#[test]
fn test_parse_start() {
    let config = Config::parse_from(["dbeerer", "start", "oidc-basic", "--force", "--debug"]);
    assert!(matches!(
        config.command,
        Command::Start { ref scenario_id, force: true } if scenario_id == "oidc-basic"
    ));
    assert_eq!(config.log_level(), LevelFilter::DEBUG);
    assert_eq!(config.helm.release_prefix, "devopsbeerer");
}

#[test]
fn test_parse_infra() {
    let config = Config::parse_from(["dbeerer", "--helm-timeout", "90s", "infra", "status"]);
    assert!(matches!(config.command, Command::Infra(InfraCommand::Status)));
    assert_eq!(config.helm.timeout(), std::time::Duration::from_secs(90));
}
