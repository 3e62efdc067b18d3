use crate::cluster::Cluster;
use crate::infra::{check_components, ComponentHealth};
use anyhow::Result;
use dbeerer_scenarios::{Helm, ReleaseStatus};

pub async fn status(cluster: &Cluster) -> Result<()> {
    println!("🍺 Infrastructure:");
    print_infra(&cluster.client, &cluster.helm).await;
    Ok(())
}

/// Prints cluster reachability and component health. An unreachable cluster
/// is reported, not returned as an error.
pub async fn print_infra(client: &kube::Client, helm: &Helm) {
    match client.apiserver_version().await {
        Ok(version) => println!("  Cluster: ✅ Running ({})", version.git_version),
        Err(err) => {
            println!("  Cluster: ❌ Unreachable ({err})");
            return;
        }
    }

    for health in check_components(client, helm).await {
        println!("  {}: {}", health.component.name, describe(&health));
    }
}

fn describe(health: &ComponentHealth) -> String {
    if health.is_healthy() {
        "✅ Running".to_owned()
    } else if health.release != ReleaseStatus::Deployed {
        format!("❌ Helm release {}", health.release)
    } else {
        "❌ Pods not ready".to_owned()
    }
}
