use crate::naming::{Naming, DEFAULT_RELEASE_PREFIX};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use url::Url;

/// Where charts come from when a scenario doesn't declare a git repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartFallback {
    /// Download the repository tarball and extract the chart directory
    Archive,
    /// Fetch Chart.yaml and values.yaml one by one (deprecated)
    Files,
}

#[derive(Debug, Clone, Args)]
#[group(skip)]
pub struct ChartSourceConfig {
    /// Repository hosting the scenario charts, as owner/name
    #[clap(
        long,
        env = "DBEERER_CHARTS_REPOSITORY",
        default_value = "DevOpsBeerer/playground-scenarios-charts"
    )]
    pub charts_repository: String,

    #[clap(long, env = "DBEERER_CHARTS_BRANCH", default_value = "main")]
    pub charts_branch: String,

    #[clap(
        long,
        env = "DBEERER_ARCHIVE_BASE_URL",
        default_value = "https://github.com"
    )]
    pub archive_base_url: Url,

    #[clap(
        long,
        env = "DBEERER_RAW_BASE_URL",
        default_value = "https://raw.githubusercontent.com"
    )]
    pub raw_base_url: Url,

    #[clap(long, env = "DBEERER_CHART_FALLBACK", value_enum, default_value_t = ChartFallback::Archive)]
    pub chart_fallback: ChartFallback,
}

impl ChartSourceConfig {
    /// The repository name without its owner, which GitHub uses as the root
    /// directory of its archives.
    pub fn repository_name(&self) -> &str {
        self.charts_repository
            .rsplit('/')
            .next()
            .unwrap_or(&self.charts_repository)
    }
}

#[derive(Debug, Clone, Args)]
#[group(skip)]
pub struct HelmConfig {
    #[clap(long, env = "DBEERER_HELM", default_value = "helm")]
    pub helm_binary: PathBuf,

    /// Storage driver for Helm releases (secret, configmap, memory)
    #[clap(long, env = "HELM_DRIVER")]
    pub helm_driver: Option<String>,

    /// How long to wait for an install or uninstall to settle
    #[clap(long, env = "DBEERER_HELM_TIMEOUT", default_value = "5m")]
    pub helm_timeout: humantime::Duration,

    /// Prefix of release and namespace names
    #[clap(long, env = "DBEERER_RELEASE_PREFIX", default_value = DEFAULT_RELEASE_PREFIX)]
    pub release_prefix: String,
}

impl HelmConfig {
    pub fn timeout(&self) -> std::time::Duration {
        self.helm_timeout.into()
    }

    pub fn naming(&self) -> Naming {
        Naming::new(&self.release_prefix)
    }
}

#[derive(Debug, Clone, Args)]
#[group(skip)]
pub struct CatalogConfig {
    /// JSON document listing scenarios. When unset, scenarios are read from
    /// ScenarioDefinition resources in the cluster.
    #[clap(long, env = "DBEERER_METADATA_URL")]
    pub metadata_url: Option<Url>,
}
