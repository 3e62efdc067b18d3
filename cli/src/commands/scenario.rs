use crate::cluster::Controller;
use anyhow::Result;
use dbeerer_scenarios::{InstallOutcome, Naming, ScenarioCatalog, ScenarioDefinition};
use itertools::Itertools;
use tracing::info;

pub async fn list(controller: &Controller) -> Result<()> {
    info!("🍺 Fetching available scenarios...");
    let scenarios = controller.catalog().list().await?;
    if scenarios.is_empty() {
        println!("No scenarios found");
        return Ok(());
    }

    println!("\n🍺 Available Scenarios ({} found):\n", scenarios.len());
    for scenario in &scenarios {
        println!("  📋 {} ({})", scenario.display_name(), scenario.id);
        if !scenario.description.is_empty() {
            println!("     {}", scenario.description);
        }
        if !scenario.tags.is_empty() {
            println!("     🏷️  {}", scenario.tags.iter().join(", "));
        }
        println!();
    }
    println!("Usage: dbeerer start <scenario-id>");
    Ok(())
}

pub async fn start(controller: &Controller, scenario_id: &str, force: bool) -> Result<()> {
    info!("🍺 Starting scenario: {scenario_id}");
    match controller.install(scenario_id, force).await? {
        InstallOutcome::Installed { scenario, notice } => {
            print_scenario_info(&scenario, controller.naming());
            if let Some(notice) = notice {
                println!("\n⚠️  Warning: {notice}");
            }
        }
        InstallOutcome::AlreadyActive(scenario) => {
            print_scenario_info(&scenario, controller.naming())
        }
    }
    Ok(())
}

pub async fn stop(controller: &Controller) -> Result<()> {
    info!("🍺 Stopping current scenario...");
    let record = controller.uninstall().await?;
    println!("✅ Scenario '{}' stopped", record.display_name());
    Ok(())
}

fn print_scenario_info(scenario: &ScenarioDefinition, naming: &Naming) {
    let release = naming.release_name(&scenario.id);
    let namespace = naming.namespace(&scenario.id);

    println!("\n📋 Scenario Information:");
    println!("------------------------");
    println!("Name: {}", scenario.display_name());
    println!("ID: {}", scenario.id);
    if !scenario.description.is_empty() {
        println!("Description: {}", scenario.description);
    }
    if !scenario.features.is_empty() {
        println!("\n🎯 Features:");
        for feature in &scenario.features {
            println!("  • {feature}");
        }
    }

    println!("\n⚙️  Helm Release: {release}");
    println!("📁 Namespace: {namespace}");

    println!("\n💡 Tips:");
    println!("  • Check pods: kubectl get pods -n {namespace}");
    println!("  • Check services: kubectl get svc -n {namespace}");
    println!("  • Check ingress: kubectl get ingress -n {namespace}");
    println!("  • View logs: kubectl logs -n {namespace} <pod>");
    println!("  • Check status: kubectl get activescenario");
    println!("  • Get Helm values: helm get values {release} -n {namespace}");
}
