use crate::active::{ActiveScenarioRecord, Phase};
use crate::catalog::ScenarioCatalog;
use crate::chart_source::ChartResolver;
use crate::definition::ScenarioDefinition;
use crate::error::{ScenarioError, ScenarioResult};
use crate::installer::{PackageInstaller, ReleaseStatus};
use crate::naming::{validate_scenario_id, Naming};
use crate::store::{ActiveScenarioStore, Versioned};
use crate::tracker::ActiveScenarioTracker;
use maplit::btreemap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed {
        scenario: ScenarioDefinition,
        /// Caveat reported by the chart source, also kept as the record's
        /// message
        notice: Option<String>,
    },
    /// The scenario was already running, nothing was done
    AlreadyActive(ScenarioDefinition),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioStatus {
    pub record: ActiveScenarioRecord,
    pub release: ReleaseStatus,
}

/// Installs, replaces and removes the single active scenario.
pub struct LifecycleController<C, R, S, I> {
    catalog: C,
    resolver: R,
    tracker: ActiveScenarioTracker<S>,
    installer: I,
    naming: Naming,
}

impl<C, R, S, I> LifecycleController<C, R, S, I>
where
    C: ScenarioCatalog,
    R: ChartResolver,
    S: ActiveScenarioStore,
    I: PackageInstaller,
{
    pub fn new(catalog: C, resolver: R, store: S, installer: I, naming: Naming) -> Self {
        Self {
            catalog,
            resolver,
            tracker: ActiveScenarioTracker::new(store, naming.clone()),
            installer,
            naming,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn installer(&self) -> &I {
        &self.installer
    }

    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    /// Makes `scenario_id` the active scenario, tearing down whatever else
    /// was active. `force` also reinstalls a same-scenario record left behind
    /// by an interrupted install.
    #[tracing::instrument(err, skip(self))]
    pub async fn install(&self, scenario_id: &str, force: bool) -> ScenarioResult<InstallOutcome> {
        validate_scenario_id(scenario_id)?;

        info!("🔍 Checking if scenario exists: {scenario_id}");
        let scenario = self.catalog.get(scenario_id).await?;
        info!("✅ Found scenario: {}", scenario.display_name());

        info!("🔍 Checking for existing scenario deployment...");
        if let Some(active) = self.tracker.get_active().await? {
            let active = active.value;
            if active.scenario_id != scenario.id {
                info!(
                    "🔄 Switching from scenario '{}' to '{}'",
                    active.scenario_id, scenario.id
                );
                if let Err(err) = self.uninstall().await {
                    warn!("⚠️  Failed removing previous scenario: {err}");
                }
            } else if active.phase == Phase::Running {
                info!("✅ Scenario '{}' is already active", scenario.id);
                return Ok(InstallOutcome::AlreadyActive(scenario));
            } else if force {
                warn!(
                    "⚠️  Scenario '{}' was left in phase {}, reinstalling",
                    scenario.id, active.phase
                );
                if let Err(err) = self.uninstall().await {
                    warn!("⚠️  Failed cleaning up interrupted install: {err}");
                }
            } else {
                return Err(ScenarioError::StaleScenario {
                    scenario_id: active.scenario_id,
                    phase: active.phase,
                });
            }
        }

        info!("📝 Creating ActiveScenario resource...");
        let mut current = match self.tracker.begin_install(&scenario).await {
            Ok(current) => current,
            Err(ScenarioError::AlreadyActiveSameScenario(_)) => {
                info!("✅ Scenario '{}' is already active", scenario.id);
                return Ok(InstallOutcome::AlreadyActive(scenario));
            }
            Err(err) => return Err(err),
        };

        match self.deploy(&scenario, &mut current).await {
            Ok(notice) => {
                info!("🎉 Scenario '{}' installed successfully!", scenario.display_name());
                Ok(InstallOutcome::Installed { scenario, notice })
            }
            Err(err) => {
                self.discard_record(&current).await;
                Err(err)
            }
        }
    }

    /// Everything after the record exists. Any error leaves the record for
    /// the caller to discard. Returns the chart's notice, if any.
    async fn deploy(
        &self,
        scenario: &ScenarioDefinition,
        current: &mut Versioned<ActiveScenarioRecord>,
    ) -> ScenarioResult<Option<String>> {
        info!("📥 Downloading chart for scenario: {}", scenario.id);
        let bundle = self.resolver.resolve(scenario).await?;
        let notice = bundle.notice().map(str::to_owned);

        self.tracker.transition(current, Phase::Deploying).await?;

        info!("📦 Installing scenario via Helm...");
        let release = self.naming.release_name(&scenario.id);
        let namespace = self.naming.namespace(&scenario.id);
        let values = btreemap! {
            "scenario.id".to_owned() => scenario.id.clone(),
        };
        self.installer
            .install(bundle.path(), &release, &namespace, &values)
            .await?;

        current.value.message = notice.clone();
        self.tracker.transition(current, Phase::Running).await?;

        if let Err(err) = bundle.close() {
            warn!("⚠️  Failed removing downloaded chart: {err}");
        }
        Ok(notice)
    }

    async fn discard_record(&self, current: &Versioned<ActiveScenarioRecord>) {
        match self.tracker.end_uninstall(current).await {
            Ok(()) | Err(ScenarioError::NoActiveScenario) => {
                debug!("active scenario record discarded")
            }
            Err(ScenarioError::ConcurrentModification) => {
                warn!("⚠️  ActiveScenario was replaced by another client, leaving it in place")
            }
            Err(err) => warn!("⚠️  Failed removing ActiveScenario record: {err}"),
        }
    }

    /// Removes the active scenario. Helm failures are only reported: the
    /// record is deleted regardless so that later installs aren't blocked.
    #[tracing::instrument(err, skip(self))]
    pub async fn uninstall(&self) -> ScenarioResult<ActiveScenarioRecord> {
        let mut current = self
            .tracker
            .get_active()
            .await?
            .ok_or(ScenarioError::NoActiveScenario)?;
        let active = current.value.clone();
        info!("🗑️  Uninstalling scenario: {}", active.scenario_id);

        match self.tracker.transition(&mut current, Phase::Terminating).await {
            Ok(()) => (),
            // Someone else owns the record now, their scenario must stay
            Err(err @ ScenarioError::ConcurrentModification) => return Err(err),
            Err(err) => warn!("⚠️  Failed marking scenario as terminating: {err}"),
        }

        let release = self.naming.release_name(&active.scenario_id);
        let namespace = self.naming.namespace(&active.scenario_id);
        info!("📦 Uninstalling Helm release: {release} from namespace: {namespace}");
        match self.installer.uninstall(&release, &namespace).await {
            Ok(()) => info!("✅ Helm release uninstalled"),
            Err(err) => warn!("⚠️  Helm uninstall warning: {err}"),
        }

        info!("📁 Ensuring namespace removed: {namespace}");
        if let Err(err) = self.installer.delete_namespace(&namespace).await {
            debug!("ignoring namespace deletion failure: {err}");
        }

        self.tracker.end_uninstall(&current).await?;
        info!("✅ ActiveScenario resource deleted");
        Ok(active)
    }

    /// The active record and the state of its Helm release, if a scenario is
    /// active.
    pub async fn status(&self) -> ScenarioResult<Option<ScenarioStatus>> {
        let Some(Versioned { value: record, .. }) = self.tracker.get_active().await? else {
            return Ok(None);
        };
        let release = self
            .installer
            .status(
                &self.naming.release_name(&record.scenario_id),
                &self.naming.namespace(&record.scenario_id),
            )
            .await?;
        Ok(Some(ScenarioStatus { record, release }))
    }
}
