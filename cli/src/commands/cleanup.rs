use crate::cluster::Controller;
use crate::infra::COMPONENTS;
use anyhow::Result;
use dbeerer_scenarios::{PackageInstaller, ScenarioError};
use tracing::{info, warn};

pub async fn run(controller: &Controller, keep_infra: bool) -> Result<()> {
    info!("🍺 Cleaning up DevOpsBeerer...");

    info!("🗑️  Removing active scenario...");
    match controller.uninstall().await {
        Ok(record) => info!("✅ Scenario '{}' removed", record.scenario_id),
        Err(ScenarioError::NoActiveScenario) => info!("No active scenario"),
        Err(err) => return Err(err.into()),
    }

    if !keep_infra {
        info!("🗑️  Removing infrastructure...");
        let helm = controller.installer();
        for component in COMPONENTS.iter().rev() {
            info!("📦 Uninstalling {}", component.name);
            if let Err(err) = helm.uninstall(component.release, component.namespace).await {
                warn!("⚠️  Failed uninstalling {}: {err}", component.name);
            }
            if let Err(err) = helm.delete_namespace(component.namespace).await {
                warn!("⚠️  Failed deleting namespace {}: {err}", component.namespace);
            }
        }
    }

    info!("✅ Cleanup completed!");
    Ok(())
}
