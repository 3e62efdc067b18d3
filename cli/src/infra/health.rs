use super::{Component, COMPONENTS};
use dbeerer_scenarios::{PackageInstaller, ReleaseStatus};
use futures::future::join_all;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub component: Component,
    pub release: ReleaseStatus,
    pub pods_ready: bool,
}

impl ComponentHealth {
    pub fn is_healthy(&self) -> bool {
        self.release == ReleaseStatus::Deployed && self.pods_ready
    }
}

pub async fn check_components<I>(client: &kube::Client, helm: &I) -> Vec<ComponentHealth>
where
    I: PackageInstaller,
{
    join_all(
        COMPONENTS
            .iter()
            .map(|component| check_component(client, helm, *component)),
    )
    .await
}

async fn check_component<I>(client: &kube::Client, helm: &I, component: Component) -> ComponentHealth
where
    I: PackageInstaller,
{
    let release = match helm.status(component.release, component.namespace).await {
        Ok(status) => status,
        Err(err) => ReleaseStatus::Other(err.to_string()),
    };

    let pods_ready = if release == ReleaseStatus::Deployed {
        let pods: Api<Pod> = Api::namespaced(client.clone(), component.namespace);
        let mut params = ListParams::default();
        if let Some(selector) = component.selector {
            params = params.labels(selector);
        }
        match pods.list(&params).await {
            Ok(list) => pods_ready(&list.items),
            Err(err) => {
                debug!("Failed listing pods of {}: {err}", component.name);
                false
            }
        }
    } else {
        false
    };

    ComponentHealth {
        component,
        release,
        pods_ready,
    }
}

/// True when there is at least one pod and every pod has all its containers
/// ready and a `Ready` condition set to `True`.
pub fn pods_ready(pods: &[Pod]) -> bool {
    !pods.is_empty() && pods.iter().all(pod_ready)
}

fn pod_ready(pod: &Pod) -> bool {
    let Some(status) = &pod.status else {
        return false;
    };
    let containers_ready = status
        .container_statuses
        .iter()
        .flatten()
        .all(|container| container.ready);
    let condition_ready = status
        .conditions
        .iter()
        .flatten()
        .any(|condition| condition.type_ == "Ready" && condition.status == "True");
    containers_ready && condition_ready
}
