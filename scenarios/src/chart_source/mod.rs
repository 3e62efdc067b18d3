mod archive;
mod files;
mod git;

pub use archive::extract_chart;

use crate::config::{ChartFallback, ChartSourceConfig};
use crate::definition::ScenarioDefinition;
use crate::error::{ScenarioError, ScenarioResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::debug;
use url::Url;

const CHART_MANIFEST: &str = "Chart.yaml";

/// A chart materialized on local disk. The whole working directory is
/// removed when the bundle is dropped.
#[derive(Debug)]
pub struct ChartBundle {
    workdir: TempDir,
    chart_dir: PathBuf,
    notice: Option<String>,
}

impl ChartBundle {
    /// A fresh, empty working directory for one resolution.
    pub fn workdir() -> std::io::Result<TempDir> {
        tempfile::Builder::new()
            .prefix("devopsbeerer-chart-")
            .tempdir()
    }

    pub fn new(workdir: TempDir, chart_dir: impl AsRef<Path>) -> Self {
        let chart_dir = workdir.path().join(chart_dir);
        Self {
            workdir,
            chart_dir,
            notice: None,
        }
    }

    /// Attaches a caveat about the chart that the user has to see.
    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.chart_dir
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Removes the bundle, reporting failures that `Drop` would swallow.
    pub fn close(self) -> std::io::Result<()> {
        self.workdir.close()
    }
}

#[async_trait]
pub trait ChartResolver: Send + Sync {
    async fn resolve(&self, scenario: &ScenarioDefinition) -> ScenarioResult<ChartBundle>;
}

/// How a scenario's chart will be acquired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSource {
    /// Shallow clone of `repository`, chart in `directory`
    Git {
        repository: String,
        directory: PathBuf,
    },
    /// Repository tarball, chart entries under `prefix`
    Archive { url: Url, prefix: String },
    /// Individual files under `base_url`
    Files { base_url: Url },
}

pub struct ChartSourceResolver {
    config: ChartSourceConfig,
    http: reqwest::Client,
    clone_timeout: Duration,
}

impl ChartSourceResolver {
    pub fn new(config: ChartSourceConfig, http: reqwest::Client, clone_timeout: Duration) -> Self {
        Self {
            config,
            http,
            clone_timeout,
        }
    }

    pub fn select(&self, scenario: &ScenarioDefinition) -> ScenarioResult<ChartSource> {
        let directory = scenario.chart_directory();
        let relative = safe_relative(Path::new(directory)).ok_or_else(|| {
            ScenarioError::ChartNotFound {
                scenario: scenario.id.clone(),
                detail: format!("invalid chart directory '{directory}'"),
            }
        })?;

        if let Some(repository) = scenario.repository_link() {
            return Ok(ChartSource::Git {
                repository: repository.to_owned(),
                directory: relative,
            });
        }

        let repository = &self.config.charts_repository;
        let branch = &self.config.charts_branch;
        match self.config.chart_fallback {
            ChartFallback::Archive => Ok(ChartSource::Archive {
                url: join_url(
                    &self.config.archive_base_url,
                    &format!("{repository}/archive/refs/heads/{branch}.tar.gz"),
                )
                .map_err(|err| resolution_error(scenario, err))?,
                prefix: format!(
                    "{}-{}/{}/",
                    self.config.repository_name(),
                    branch.replace('/', "-"),
                    directory
                ),
            }),
            ChartFallback::Files => Ok(ChartSource::Files {
                base_url: join_url(
                    &self.config.raw_base_url,
                    &format!("{repository}/refs/heads/{branch}/{directory}/"),
                )
                .map_err(|err| resolution_error(scenario, err))?,
            }),
        }
    }
}

#[async_trait]
impl ChartResolver for ChartSourceResolver {
    #[tracing::instrument(err, skip_all, fields(scenario = %scenario.id))]
    async fn resolve(&self, scenario: &ScenarioDefinition) -> ScenarioResult<ChartBundle> {
        let source = self.select(scenario)?;
        debug!(?source, "resolving chart");
        let bundle = match source {
            ChartSource::Git {
                repository,
                directory,
            } => git::clone_chart(&repository, &directory, &scenario.id, self.clone_timeout).await,
            ChartSource::Archive { url, prefix } => {
                archive::download_chart(&self.http, &url, &prefix, &scenario.id).await
            }
            ChartSource::Files { base_url } => {
                files::fetch_chart(&self.http, &base_url, &scenario.id).await
            }
        }?;

        if !bundle.path().join(CHART_MANIFEST).is_file() {
            return Err(ScenarioError::IncompleteChart(
                scenario.id.clone(),
                format!("no {CHART_MANIFEST} in {}", scenario.chart_directory()),
            ));
        }
        Ok(bundle)
    }
}

fn resolution_error(scenario: &ScenarioDefinition, err: impl std::fmt::Display) -> ScenarioError {
    ScenarioError::ResolutionFailed(scenario.id.clone(), err.to_string())
}

fn join_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join(path)
}

/// Keeps only plain path components, refusing anything that would leave the
/// directory it is joined to.
pub(crate) fn safe_relative(path: &Path) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => (),
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}
