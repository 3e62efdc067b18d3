use crate::active::{ActiveScenarioRecord, Phase};
use crate::definition::ScenarioDefinition;
use crate::error::{ScenarioError, ScenarioResult};
use crate::naming::Naming;
use crate::store::{ActiveScenarioStore, Versioned};
use chrono::prelude::*;
use tracing::{debug, info};

/// Owns every write to the active-scenario record. At most one record exists
/// at a time. Writes carry the version the caller last saw, so a record that
/// another client replaced in between is never overwritten or deleted.
pub struct ActiveScenarioTracker<S> {
    store: S,
    naming: Naming,
}

impl<S: ActiveScenarioStore> ActiveScenarioTracker<S> {
    pub fn new(store: S, naming: Naming) -> Self {
        Self { store, naming }
    }

    pub async fn get_active(&self) -> ScenarioResult<Option<Versioned<ActiveScenarioRecord>>> {
        self.store.get().await
    }

    /// Replaces whatever record exists with a `Pending` one for `scenario`.
    /// A record for the same scenario is left untouched and reported as
    /// `AlreadyActiveSameScenario`.
    #[tracing::instrument(err, skip_all, fields(scenario = %scenario.id))]
    pub async fn begin_install(
        &self,
        scenario: &ScenarioDefinition,
    ) -> ScenarioResult<Versioned<ActiveScenarioRecord>> {
        if let Some(existing) = self.store.get().await? {
            if existing.value.scenario_id == scenario.id {
                return Err(ScenarioError::AlreadyActiveSameScenario(scenario.id.clone()));
            }
            info!(
                "Replacing active scenario record of '{}'",
                existing.value.scenario_id
            );
            self.store.delete(Some(&existing.version)).await?;
        }

        let now = Utc::now();
        let record = ActiveScenarioRecord {
            scenario_id: scenario.id.clone(),
            scenario_name: Some(scenario.display_name().to_owned()),
            phase: Phase::Pending,
            helm_release_name: Some(self.naming.release_name(&scenario.id)),
            start_time: Some(now),
            last_transition_time: Some(now),
            message: None,
        };
        let version = self.store.create(&record).await?;
        debug!("record created");
        Ok(Versioned {
            value: record,
            version,
        })
    }

    /// Moves `current` forward to `phase` and refreshes its version. Going
    /// back along `Pending < Deploying < Running` is rejected, and so is a
    /// `current` that is no longer the stored record.
    #[tracing::instrument(err, skip(self, current), fields(scenario = %current.value.scenario_id))]
    pub async fn transition(
        &self,
        current: &mut Versioned<ActiveScenarioRecord>,
        phase: Phase,
    ) -> ScenarioResult<()> {
        if !current.value.phase.can_transition_to(phase) {
            return Err(ScenarioError::InvalidTransition {
                from: current.value.phase,
                to: phase,
            });
        }

        let mut record = current.value.clone();
        record.phase = phase;
        record.last_transition_time = Some(Utc::now());
        let version = self.store.update(&record, &current.version).await?;
        debug!("phase updated");
        *current = Versioned {
            value: record,
            version,
        };
        Ok(())
    }

    /// Deletes `current`. Fails with `NoActiveScenario` if there is no record
    /// and with `ConcurrentModification` if it was replaced.
    #[tracing::instrument(err, skip_all, fields(scenario = %current.value.scenario_id))]
    pub async fn end_uninstall(&self, current: &Versioned<ActiveScenarioRecord>) -> ScenarioResult<()> {
        self.store.delete(Some(&current.version)).await
    }
}
