use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

const CHECKOUT_DIR: &str = "playground";

/// Run in order from the root of the playground checkout.
const SCRIPTS: [(&str, &str); 2] = [
    ("install-k3s.sh", "🚀 Installing K3s..."),
    (
        "init-k3s.sh",
        "⚙️  Initializing K3s with components (cert-manager, SSO, ingress controller)...",
    ),
];

/// Clones the playground repository and runs its install scripts, streaming
/// their output to the terminal.
#[tracing::instrument(err)]
pub async fn deploy(repository: &str) -> Result<()> {
    info!("🍺 Starting infrastructure deployment...");
    let workdir = tempfile::Builder::new()
        .prefix("devopsbeerer-infra-")
        .tempdir()?;
    let checkout = workdir.path().join(CHECKOUT_DIR);

    info!("📥 Cloning playground repository...");
    run(Command::new("git")
        .args(["clone", "--depth", "1"])
        .arg(repository)
        .arg(&checkout))
    .await
    .with_context(|| format!("Failed cloning {repository}"))?;

    for (script, message) in SCRIPTS {
        info!("{message}");
        run_script(&checkout, script)
            .await
            .with_context(|| format!("{script} failed"))?;
        info!("✅ {script} completed");
    }

    info!("✅ Infrastructure deployed successfully!");
    if let Err(err) = workdir.close() {
        warn!("⚠️  Failed cleaning up temporary files: {err}");
    }
    Ok(())
}

async fn run_script(checkout: &Path, script: &str) -> Result<()> {
    let path = checkout.join(script);
    if !path.is_file() {
        bail!("{script} not found in the playground repository");
    }
    run(Command::new("bash").arg(&path).current_dir(checkout)).await
}

async fn run(command: &mut Command) -> Result<()> {
    debug!(?command);
    let status = command.kill_on_drop(true).status().await?;
    if !status.success() {
        bail!("exited with {status}");
    }
    Ok(())
}
