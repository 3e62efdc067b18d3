use crate::active::{ActiveScenarioRecord, ActiveScenarioResource, ACTIVE_SCENARIO_NAME};
use crate::error::{ScenarioError, ScenarioResult};
use async_trait::async_trait;
use kube::api::{Api, DeleteParams, PostParams, Preconditions};
use kube::ResourceExt;
use tracing::{debug, warn};

/// A stored value together with the version token it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: String,
}

/// Backing store of the singleton active-scenario record. Writes that carry
/// a version fail with `ConcurrentModification` when the stored record has
/// moved on.
#[async_trait]
pub trait ActiveScenarioStore: Send + Sync {
    async fn get(&self) -> ScenarioResult<Option<Versioned<ActiveScenarioRecord>>>;

    /// Stores a new record; fails if one already exists.
    async fn create(&self, record: &ActiveScenarioRecord) -> ScenarioResult<String>;

    async fn update(&self, record: &ActiveScenarioRecord, version: &str) -> ScenarioResult<String>;

    /// Fails with `NoActiveScenario` when there is nothing to delete.
    async fn delete(&self, version: Option<&str>) -> ScenarioResult<()>;
}

/// Keeps the record as the cluster-scoped `ActiveScenario` resource; phase
/// and timestamps go through the status subresource.
pub struct KubeActiveScenarioStore {
    api: Api<ActiveScenarioResource>,
}

impl KubeActiveScenarioStore {
    pub fn new(client: kube::Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }

    async fn replace_status(&self, resource: &ActiveScenarioResource) -> ScenarioResult<String> {
        let updated = self
            .api
            .replace_status(
                ACTIVE_SCENARIO_NAME,
                &PostParams::default(),
                serde_json::to_vec(resource)?,
            )
            .await
            .map_err(write_error)?;
        Ok(updated.resource_version().unwrap_or_default())
    }
}

#[async_trait]
impl ActiveScenarioStore for KubeActiveScenarioStore {
    async fn get(&self) -> ScenarioResult<Option<Versioned<ActiveScenarioRecord>>> {
        Ok(self
            .api
            .get_opt(ACTIVE_SCENARIO_NAME)
            .await?
            .map(|resource| Versioned {
                value: ActiveScenarioRecord::from(&resource),
                version: resource.resource_version().unwrap_or_default(),
            }))
    }

    #[tracing::instrument(err, skip_all, fields(scenario_id = %record.scenario_id))]
    async fn create(&self, record: &ActiveScenarioRecord) -> ScenarioResult<String> {
        let mut resource = ActiveScenarioResource::from(record);
        let status = resource.status.take();
        let mut created = self
            .api
            .create(&PostParams::default(), &resource)
            .await
            .map_err(write_error)?;
        debug!("created");

        // Status is ignored on create, it has to be written separately. A
        // record without its status must not outlive a failed create.
        created.status = status;
        match self.replace_status(&created).await {
            Ok(version) => Ok(version),
            Err(err) => {
                if let Err(cleanup) = self.delete(created.resource_version().as_deref()).await {
                    warn!("Failed removing incomplete ActiveScenario: {cleanup}");
                }
                Err(err)
            }
        }
    }

    #[tracing::instrument(err, skip_all, fields(phase = %record.phase))]
    async fn update(&self, record: &ActiveScenarioRecord, version: &str) -> ScenarioResult<String> {
        let mut resource = ActiveScenarioResource::from(record);
        resource.metadata.resource_version = Some(version.to_owned());
        self.replace_status(&resource).await
    }

    #[tracing::instrument(err, skip(self))]
    async fn delete(&self, version: Option<&str>) -> ScenarioResult<()> {
        let params = DeleteParams {
            preconditions: version.map(|version| Preconditions {
                resource_version: Some(version.to_owned()),
                uid: None,
            }),
            ..Default::default()
        };
        self.api
            .delete(ACTIVE_SCENARIO_NAME, &params)
            .await
            .map_err(write_error)?;
        Ok(())
    }
}

/// A stale version answers 409; a record deleted under our feet answers 404.
fn write_error(err: kube::Error) -> ScenarioError {
    match &err {
        kube::Error::Api(response) if http::StatusCode::CONFLICT == response.code => {
            ScenarioError::ConcurrentModification
        }
        kube::Error::Api(response) if http::StatusCode::NOT_FOUND == response.code => {
            ScenarioError::NoActiveScenario
        }
        _ => err.into(),
    }
}
