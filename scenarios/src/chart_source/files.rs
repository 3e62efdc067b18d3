use super::ChartBundle;
use crate::error::{ScenarioError, ScenarioResult};
use reqwest::StatusCode;
use tracing::{info, warn};
use url::Url;

const CHART_DIR: &str = "chart";
const CHART_FILES: [&str; 2] = ["Chart.yaml", "values.yaml"];

/// Deprecated: only the chart manifest and default values are fetched, so
/// any chart with templates comes out incomplete.
pub(super) async fn fetch_chart(
    http: &reqwest::Client,
    base_url: &Url,
    scenario_id: &str,
) -> ScenarioResult<ChartBundle> {
    let notice = format!(
        "chart fetched file by file: only {} were downloaded, templates/ was NOT. \
         Declare a helmChart.link or use --chart-fallback=archive for charts with templates.",
        CHART_FILES.join(" and ")
    );
    warn!("⚠️  {scenario_id}: {notice}");

    let workdir = ChartBundle::workdir()?;
    let dest = workdir.path().join(CHART_DIR);
    tokio::fs::create_dir_all(&dest).await?;

    for filename in CHART_FILES {
        let url = base_url.join(filename).map_err(|err| {
            ScenarioError::ResolutionFailed(scenario_id.to_owned(), err.to_string())
        })?;
        let failed = |err: reqwest::Error| {
            ScenarioError::ResolutionFailed(scenario_id.to_owned(), format!("{url}: {err}"))
        };

        info!("📥 Fetching {url}");
        let response = http.get(url.clone()).send().await.map_err(failed)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ScenarioError::ChartNotFound {
                scenario: scenario_id.to_owned(),
                detail: format!("{url} not found"),
            });
        }
        let body = response
            .error_for_status()
            .map_err(failed)?
            .bytes()
            .await
            .map_err(failed)?;
        tokio::fs::write(dest.join(filename), body).await?;
    }

    Ok(ChartBundle::new(workdir, CHART_DIR).with_notice(notice))
}
