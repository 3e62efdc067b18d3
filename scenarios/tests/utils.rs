#![allow(dead_code)]

use async_trait::async_trait;
use dbeerer_scenarios::{
    ActiveScenarioRecord, ActiveScenarioStore, ChartBundle, ChartResolver, HelmChartRef,
    LifecycleController, Naming, PackageInstaller, Phase, ReleaseStatus, ScenarioCatalog,
    ScenarioDefinition, ScenarioError, ScenarioResult, Versioned,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub fn scenario(id: &str) -> ScenarioDefinition {
    ScenarioDefinition {
        id: id.to_owned(),
        name: format!("Scenario {id}"),
        description: format!("Description of {id}"),
        tags: vec!["oidc".to_owned()],
        features: vec!["login".to_owned()],
        helm_chart: HelmChartRef::default(),
    }
}

pub fn record(scenario_id: &str, phase: Phase) -> ActiveScenarioRecord {
    ActiveScenarioRecord {
        scenario_id: scenario_id.to_owned(),
        scenario_name: None,
        phase,
        helm_release_name: None,
        start_time: None,
        last_transition_time: None,
        message: None,
    }
}

// ----------
// Archives
// ----------

pub enum Entry<'a> {
    Dir(&'a str, u32),
    File(&'a str, &'a str, u32),
}

/// A gzipped tarball holding `entries` in order.
pub fn tarball(entries: &[Entry]) -> anyhow::Result<Vec<u8>> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        match entry {
            Entry::Dir(path, mode) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(*mode);
                header.set_size(0);
                builder.append_data(&mut header, path, std::io::empty())?;
            }
            Entry::File(path, contents, mode) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(*mode);
                header.set_size(contents.len() as u64);
                builder.append_data(&mut header, path, contents.as_bytes())?;
            }
        }
    }
    Ok(builder.into_inner()?.finish()?)
}

// ----------
// Store
// ----------

#[derive(Default)]
struct StoreState {
    record: Option<ActiveScenarioRecord>,
    version: u64,
    race: bool,
}

/// In-memory store with the same version semantics as the cluster.
#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<StoreState>>,
}

impl FakeStore {
    pub fn record(&self) -> Option<ActiveScenarioRecord> {
        self.state.lock().unwrap().record.clone()
    }

    /// Stores a record directly, as another client would.
    pub fn put(&self, record: ActiveScenarioRecord) {
        let mut state = self.state.lock().unwrap();
        state.version += 1;
        state.record = Some(record);
    }

    /// From now on, another writer touches the record right after every read.
    pub fn race(&self) {
        self.state.lock().unwrap().race = true;
    }
}

#[async_trait]
impl ActiveScenarioStore for FakeStore {
    async fn get(&self) -> ScenarioResult<Option<Versioned<ActiveScenarioRecord>>> {
        let mut state = self.state.lock().unwrap();
        let stored = state.record.clone().map(|value| Versioned {
            value,
            version: state.version.to_string(),
        });
        if state.race {
            state.version += 1;
        }
        Ok(stored)
    }

    async fn create(&self, record: &ActiveScenarioRecord) -> ScenarioResult<String> {
        let mut state = self.state.lock().unwrap();
        if state.record.is_some() {
            return Err(ScenarioError::ConcurrentModification);
        }
        state.version += 1;
        state.record = Some(record.clone());
        Ok(state.version.to_string())
    }

    async fn update(&self, record: &ActiveScenarioRecord, version: &str) -> ScenarioResult<String> {
        let mut state = self.state.lock().unwrap();
        if state.record.is_none() {
            return Err(ScenarioError::NoActiveScenario);
        }
        if state.version.to_string() != version {
            return Err(ScenarioError::ConcurrentModification);
        }
        state.version += 1;
        state.record = Some(record.clone());
        Ok(state.version.to_string())
    }

    async fn delete(&self, version: Option<&str>) -> ScenarioResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.record.is_none() {
            return Err(ScenarioError::NoActiveScenario);
        }
        if let Some(version) = version {
            if state.version.to_string() != version {
                return Err(ScenarioError::ConcurrentModification);
            }
        }
        state.version += 1;
        state.record = None;
        Ok(())
    }
}

// ----------
// Installer
// ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCall {
    pub release: String,
    pub namespace: String,
    pub values: BTreeMap<String, String>,
    pub chart_present: bool,
}

type Hook = Box<dyn Fn() + Send>;

#[derive(Default)]
struct InstallerState {
    during_install: Option<Hook>,
    installs: Vec<InstallCall>,
    uninstalls: Vec<(String, String)>,
    deleted_namespaces: Vec<String>,
    deployed: HashSet<String>,
    fail_install: bool,
    fail_uninstall: bool,
}

#[derive(Clone, Default)]
pub struct FakeInstaller {
    state: Arc<Mutex<InstallerState>>,
}

impl FakeInstaller {
    pub fn fail_install(&self) {
        self.state.lock().unwrap().fail_install = true;
    }

    pub fn fail_uninstall(&self) {
        self.state.lock().unwrap().fail_uninstall = true;
    }

    /// Runs `hook` in the middle of every install, while Helm would be
    /// waiting for the workload.
    pub fn during_install(&self, hook: impl Fn() + Send + 'static) {
        self.state.lock().unwrap().during_install = Some(Box::new(hook));
    }

    pub fn installs(&self) -> Vec<InstallCall> {
        self.state.lock().unwrap().installs.clone()
    }

    pub fn uninstalls(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().uninstalls.clone()
    }

    pub fn deleted_namespaces(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_namespaces.clone()
    }
}

#[async_trait]
impl PackageInstaller for FakeInstaller {
    async fn install(
        &self,
        chart: &Path,
        release: &str,
        namespace: &str,
        values: &BTreeMap<String, String>,
    ) -> ScenarioResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(hook) = &state.during_install {
            hook();
        }
        state.installs.push(InstallCall {
            release: release.to_owned(),
            namespace: namespace.to_owned(),
            values: values.clone(),
            chart_present: chart.join("Chart.yaml").is_file(),
        });
        if state.fail_install {
            return Err(ScenarioError::InstallFailed(
                release.to_owned(),
                "timed out waiting for the condition".to_owned(),
            ));
        }
        state.deployed.insert(release.to_owned());
        Ok(())
    }

    async fn uninstall(&self, release: &str, namespace: &str) -> ScenarioResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .uninstalls
            .push((release.to_owned(), namespace.to_owned()));
        if state.fail_uninstall {
            return Err(ScenarioError::UninstallFailed(
                release.to_owned(),
                "uninstallation completed with 1 error(s)".to_owned(),
            ));
        }
        state.deployed.remove(release);
        Ok(())
    }

    async fn status(&self, release: &str, _namespace: &str) -> ScenarioResult<ReleaseStatus> {
        let state = self.state.lock().unwrap();
        Ok(if state.deployed.contains(release) {
            ReleaseStatus::Deployed
        } else {
            ReleaseStatus::NotFound
        })
    }

    async fn delete_namespace(&self, namespace: &str) -> ScenarioResult<()> {
        self.state
            .lock()
            .unwrap()
            .deleted_namespaces
            .push(namespace.to_owned());
        Ok(())
    }
}

// ----------
// Catalog
// ----------

pub struct FakeCatalog(pub Vec<ScenarioDefinition>);

#[async_trait]
impl ScenarioCatalog for FakeCatalog {
    async fn list(&self) -> ScenarioResult<Vec<ScenarioDefinition>> {
        Ok(self.0.clone())
    }
}

// ----------
// Resolver
// ----------

#[derive(Default)]
struct ResolverState {
    missing: bool,
    notice: Option<String>,
    resolved: Vec<PathBuf>,
}

/// Materializes a one-file chart, or reports it missing.
#[derive(Clone, Default)]
pub struct FakeResolver {
    state: Arc<Mutex<ResolverState>>,
}

impl FakeResolver {
    pub fn chart_missing(&self) {
        self.state.lock().unwrap().missing = true;
    }

    pub fn notice(&self, notice: &str) {
        self.state.lock().unwrap().notice = Some(notice.to_owned());
    }

    pub fn resolved(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().resolved.clone()
    }
}

#[async_trait]
impl ChartResolver for FakeResolver {
    async fn resolve(&self, scenario: &ScenarioDefinition) -> ScenarioResult<ChartBundle> {
        let mut state = self.state.lock().unwrap();
        if state.missing {
            return Err(ScenarioError::ChartNotFound {
                scenario: scenario.id.clone(),
                detail: "no entries in archive".to_owned(),
            });
        }
        let workdir = ChartBundle::workdir()?;
        let chart_dir = workdir.path().join("chart");
        std::fs::create_dir_all(&chart_dir)?;
        std::fs::write(
            chart_dir.join("Chart.yaml"),
            format!("apiVersion: v2\nname: {}\nversion: 0.1.0\n", scenario.id),
        )?;
        let mut bundle = ChartBundle::new(workdir, "chart");
        if let Some(notice) = &state.notice {
            bundle = bundle.with_notice(notice.clone());
        }
        state.resolved.push(bundle.path().to_owned());
        Ok(bundle)
    }
}

// ----------
// Controller
// ----------

pub type TestController = LifecycleController<FakeCatalog, FakeResolver, FakeStore, FakeInstaller>;

pub struct Harness {
    pub controller: TestController,
    pub store: FakeStore,
    pub installer: FakeInstaller,
    pub resolver: FakeResolver,
}

pub fn harness(scenario_ids: &[&str]) -> Harness {
    let store = FakeStore::default();
    let installer = FakeInstaller::default();
    let resolver = FakeResolver::default();
    let controller = LifecycleController::new(
        FakeCatalog(scenario_ids.iter().map(|id| scenario(id)).collect()),
        resolver.clone(),
        store.clone(),
        installer.clone(),
        Naming::default(),
    );
    Harness {
        controller,
        store,
        installer,
        resolver,
    }
}
