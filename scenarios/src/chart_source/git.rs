use super::ChartBundle;
use crate::error::{ScenarioError, ScenarioResult};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

const CHECKOUT_DIR: &str = "repo";

pub(super) async fn clone_chart(
    repository: &str,
    directory: &Path,
    scenario_id: &str,
    timeout: Duration,
) -> ScenarioResult<ChartBundle> {
    let workdir = ChartBundle::workdir()?;
    let checkout = workdir.path().join(CHECKOUT_DIR);

    info!("📂 Cloning repository: {repository}");
    let mut command = Command::new("git");
    command
        .args(["clone", "--depth", "1", "--quiet"])
        .arg(repository)
        .arg(&checkout)
        .env("GIT_TERMINAL_PROMPT", "0")
        .kill_on_drop(true);
    debug!(?command);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| {
            ScenarioError::ResolutionFailed(
                scenario_id.to_owned(),
                format!(
                    "git clone of {repository} timed out after {}",
                    humantime::format_duration(timeout)
                ),
            )
        })?
        .map_err(|err| {
            ScenarioError::ResolutionFailed(
                scenario_id.to_owned(),
                format!("failed running git: {err}"),
            )
        })?;

    if !output.status.success() {
        return Err(ScenarioError::ResolutionFailed(
            scenario_id.to_owned(),
            format!(
                "git clone of {repository} failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }

    let chart_dir = Path::new(CHECKOUT_DIR).join(directory);
    if !workdir.path().join(&chart_dir).is_dir() {
        return Err(ScenarioError::ChartNotFound {
            scenario: scenario_id.to_owned(),
            detail: format!(
                "directory '{}' not found in {repository}",
                directory.display()
            ),
        });
    }

    Ok(ChartBundle::new(workdir, chart_dir))
}
