use super::infra::print_infra;
use crate::cluster::Controller;
use anyhow::Result;

pub async fn show(controller: &Controller, client: &kube::Client) -> Result<()> {
    println!("🍺 DevOpsBeerer Status:\n");

    println!("Infrastructure:");
    print_infra(client, controller.installer()).await;

    println!("\nScenario:");
    match controller.status().await? {
        None => println!("  No active scenario"),
        Some(status) => {
            let record = &status.record;
            println!("  ID: {}", record.scenario_id);
            println!("  Name: {}", record.display_name());
            println!("  Phase: {}", record.phase);
            if let Some(release) = &record.helm_release_name {
                println!("  Helm release: {release} ({})", status.release);
            }
            if let Some(start_time) = &record.start_time {
                println!("  Started: {}", start_time.to_rfc3339());
            }
            if let Some(message) = &record.message {
                println!("  Message: {message}");
            }
        }
    }
    Ok(())
}
