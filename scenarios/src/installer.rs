use crate::config::HelmConfig;
use crate::error::{ScenarioError, ScenarioResult};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::Api;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Slack given to the helm process on top of its own `--timeout`.
const PROCESS_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseStatus {
    Deployed,
    NotFound,
    Other(String),
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployed => write!(f, "deployed"),
            Self::NotFound => write!(f, "not found"),
            Self::Other(status) => write!(f, "{status}"),
        }
    }
}

#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Installs or upgrades `release` from a local chart directory, creating
    /// the namespace when needed and waiting until the workload is ready.
    async fn install(
        &self,
        chart: &Path,
        release: &str,
        namespace: &str,
        values: &BTreeMap<String, String>,
    ) -> ScenarioResult<()>;

    async fn uninstall(&self, release: &str, namespace: &str) -> ScenarioResult<()>;

    async fn status(&self, release: &str, namespace: &str) -> ScenarioResult<ReleaseStatus>;

    /// Removes a namespace; a namespace that doesn't exist is not an error.
    async fn delete_namespace(&self, namespace: &str) -> ScenarioResult<()>;
}

// -------------------------------------------------------------------------
// Runs the helm binary against the cluster described by the kubeconfig, the
// same cluster the kube client talks to.
// -------------------------------------------------------------------------

pub struct Helm {
    config: HelmConfig,
    kubeconfig: Option<PathBuf>,
    client: kube::Client,
}

impl Helm {
    pub fn new(config: HelmConfig, kubeconfig: Option<PathBuf>, client: kube::Client) -> Self {
        Self {
            config,
            kubeconfig,
            client,
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.config.helm_binary);
        if let Some(kubeconfig) = &self.kubeconfig {
            command.env("KUBECONFIG", kubeconfig);
        }
        if let Some(driver) = &self.config.helm_driver {
            command.env("HELM_DRIVER", driver);
        }
        command.kill_on_drop(true);
        command
    }

    fn timeout_arg(&self) -> String {
        format!("{}s", self.config.timeout().as_secs())
    }

    async fn run(&self, mut command: Command) -> Result<Output, String> {
        debug!(?command);
        let limit = self.config.timeout() + PROCESS_GRACE;
        match tokio::time::timeout(limit, command.output()).await {
            Err(_) => Err(format!(
                "helm did not finish within {}",
                humantime::format_duration(limit)
            )),
            Ok(Err(err)) => Err(format!(
                "failed running {}: {err}",
                self.config.helm_binary.display()
            )),
            Ok(Ok(output)) => {
                for line in String::from_utf8_lossy(&output.stdout).lines() {
                    debug!("helm: {line}");
                }
                Ok(output)
            }
        }
    }
}

#[async_trait]
impl PackageInstaller for Helm {
    #[tracing::instrument(err, skip(self, values))]
    async fn install(
        &self,
        chart: &Path,
        release: &str,
        namespace: &str,
        values: &BTreeMap<String, String>,
    ) -> ScenarioResult<()> {
        let mut command = self.command();
        command
            .args(["upgrade", "--install", release])
            .arg(chart)
            .args(["--namespace", namespace, "--create-namespace", "--wait"])
            .args(["--timeout", &self.timeout_arg()]);
        for (key, value) in values {
            command.arg("--set").arg(format!("{key}={value}"));
        }

        info!("🚀 Installing release {release} into {namespace}");
        let output = self
            .run(command)
            .await
            .map_err(|err| ScenarioError::InstallFailed(release.to_owned(), err))?;
        if !output.status.success() {
            return Err(ScenarioError::InstallFailed(
                release.to_owned(),
                failure_message(&output),
            ));
        }
        Ok(())
    }

    #[tracing::instrument(err, skip(self))]
    async fn uninstall(&self, release: &str, namespace: &str) -> ScenarioResult<()> {
        let mut command = self.command();
        command
            .args(["uninstall", release, "--namespace", namespace, "--wait"])
            .args(["--timeout", &self.timeout_arg()]);

        let output = self
            .run(command)
            .await
            .map_err(|err| ScenarioError::UninstallFailed(release.to_owned(), err))?;
        if !output.status.success() {
            return Err(ScenarioError::UninstallFailed(
                release.to_owned(),
                failure_message(&output),
            ));
        }
        Ok(())
    }

    async fn status(&self, release: &str, namespace: &str) -> ScenarioResult<ReleaseStatus> {
        let mut command = self.command();
        command.args(["status", release, "--namespace", namespace, "--output", "json"]);

        let output = match self.run(command).await {
            Ok(output) => output,
            Err(err) => return Ok(ReleaseStatus::Other(format!("unknown ({err})"))),
        };
        if output.status.success() {
            parse_release_status(&output.stdout)
        } else {
            let message = failure_message(&output);
            if message.contains("not found") {
                Ok(ReleaseStatus::NotFound)
            } else {
                Ok(ReleaseStatus::Other(format!("unknown ({message})")))
            }
        }
    }

    #[tracing::instrument(err, skip(self))]
    async fn delete_namespace(&self, namespace: &str) -> ScenarioResult<()> {
        debug!("Deleting");
        let api = Api::<Namespace>::all(self.client.clone());
        if let Err(e) = api.delete(namespace, &Default::default()).await {
            if let kube::Error::Api(kube::core::ErrorResponse { code, .. }) = e {
                if http::StatusCode::NOT_FOUND == code {
                    debug!("Namespace not found - ignoring");
                    return Ok(());
                }
            }
            return Err(e.into());
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct HelmStatusOutput {
    info: HelmStatusInfo,
}

#[derive(Deserialize)]
struct HelmStatusInfo {
    status: String,
}

pub fn parse_release_status(stdout: &[u8]) -> ScenarioResult<ReleaseStatus> {
    let output: HelmStatusOutput = serde_json::from_slice(stdout)?;
    Ok(match output.info.status.as_str() {
        "deployed" => ReleaseStatus::Deployed,
        _ => ReleaseStatus::Other(output.info.status),
    })
}

fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("helm exited with {}", output.status)
    } else {
        stderr.to_owned()
    }
}

#[test]
fn test_parse_release_status() {
    let deployed = br#"{"name":"devopsbeerer-a","info":{"status":"deployed","notes":""}}"#;
    assert_eq!(
        parse_release_status(deployed).unwrap(),
        ReleaseStatus::Deployed
    );

    let pending = br#"{"info":{"status":"pending-install"}}"#;
    assert_eq!(
        parse_release_status(pending).unwrap(),
        ReleaseStatus::Other("pending-install".to_owned())
    );

    assert!(parse_release_status(b"not json").is_err());
}
