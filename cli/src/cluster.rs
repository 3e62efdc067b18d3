use crate::config::Config;
use anyhow::Result;
use dbeerer_scenarios::{
    Catalog, ChartSourceResolver, Helm, KubeActiveScenarioStore, LifecycleController,
};
use kube::config::{KubeConfigOptions, Kubeconfig};
use std::path::Path;
use tracing::debug;

pub type Controller =
    LifecycleController<Catalog, ChartSourceResolver, KubeActiveScenarioStore, Helm>;

pub async fn kube_client(kubeconfig: &Path) -> Result<kube::Client> {
    let config = if kubeconfig.is_file() {
        debug!("Using kubeconfig {}", kubeconfig.display());
        let kubeconfig = Kubeconfig::read_from(kubeconfig)?;
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
    } else {
        debug!(
            "{} doesn't exist, inferring cluster configuration",
            kubeconfig.display()
        );
        kube::Config::infer().await?
    };
    Ok(kube::Client::try_from(config)?)
}

/// Everything a command needs to talk to the playground cluster.
pub struct Cluster {
    pub client: kube::Client,
    pub helm: Helm,
}

impl Cluster {
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = kube_client(config.kubeconfig()).await?;
        let kubeconfig = config
            .kubeconfig()
            .is_file()
            .then(|| config.kubeconfig().to_owned());
        let helm = Helm::new(config.helm.clone(), kubeconfig, client.clone());
        Ok(Self { client, helm })
    }

    pub fn controller(self, config: &Config) -> Result<Controller> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        let catalog = Catalog::new(&config.catalog, http.clone(), self.client.clone());
        let resolver =
            ChartSourceResolver::new(config.charts.clone(), http, config.helm.timeout());
        let store = KubeActiveScenarioStore::new(self.client);
        Ok(LifecycleController::new(
            catalog,
            resolver,
            store,
            self.helm,
            config.helm.naming(),
        ))
    }
}
