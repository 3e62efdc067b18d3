use crate::config::CatalogConfig;
use crate::definition::{ScenarioDefinition, ScenarioDefinitionResource};
use crate::error::{ScenarioError, ScenarioResult};
use crate::naming::validate_scenario_id;
use async_trait::async_trait;
use kube::api::{Api, ApiResource, DynamicObject, ListParams};
use kube::ResourceExt;
use tracing::{debug, warn};
use url::Url;

#[async_trait]
pub trait ScenarioCatalog: Send + Sync {
    /// Fetches every well-formed scenario. Malformed entries are skipped.
    async fn list(&self) -> ScenarioResult<Vec<ScenarioDefinition>>;

    /// Linear search over a fresh `list()`; catalogs are small and nothing
    /// is cached between calls.
    async fn get(&self, id: &str) -> ScenarioResult<ScenarioDefinition> {
        self.list()
            .await?
            .into_iter()
            .find(|scenario| scenario.id == id)
            .ok_or_else(|| ScenarioError::ScenarioNotFound(id.to_owned()))
    }
}

/// The two places scenarios can be published.
pub enum Catalog {
    /// A JSON array of scenario records served over HTTP
    Remote { url: Url, http: reqwest::Client },
    /// Cluster-scoped `ScenarioDefinition` resources
    Cluster { client: kube::Client },
}

impl Catalog {
    pub fn new(config: &CatalogConfig, http: reqwest::Client, client: kube::Client) -> Self {
        match &config.metadata_url {
            Some(url) => Self::Remote {
                url: url.clone(),
                http,
            },
            None => Self::Cluster { client },
        }
    }

    async fn fetch_remote(url: &Url, http: &reqwest::Client) -> ScenarioResult<Vec<serde_json::Value>> {
        debug!("Fetching scenario metadata from {url}");
        let response = http
            .get(url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| ScenarioError::CatalogUnavailable(err.to_string()))?;
        let document: serde_json::Value = response
            .json()
            .await
            .map_err(|err| ScenarioError::CatalogUnavailable(format!("{url}: {err}")))?;
        match document {
            serde_json::Value::Array(records) => Ok(records),
            serde_json::Value::Object(mut fields) => match fields.remove("scenarios") {
                Some(serde_json::Value::Array(records)) => Ok(records),
                _ => Err(ScenarioError::CatalogUnavailable(format!(
                    "{url}: expected an array of scenarios"
                ))),
            },
            _ => Err(ScenarioError::CatalogUnavailable(format!(
                "{url}: expected an array of scenarios"
            ))),
        }
    }

    async fn fetch_cluster(client: &kube::Client) -> ScenarioResult<Vec<serde_json::Value>> {
        // Listing untyped objects keeps one bad resource from failing the
        // whole list.
        let resource = ApiResource::erase::<ScenarioDefinitionResource>(&());
        let api = Api::<DynamicObject>::all_with(client.clone(), &resource);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|err| ScenarioError::CatalogUnavailable(err.to_string()))?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|object| match object.data.get("spec") {
                Some(spec) => Some(spec.clone()),
                None => {
                    warn!("Skipping ScenarioDefinition {}: spec not found", object.name_any());
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl ScenarioCatalog for Catalog {
    #[tracing::instrument(err, skip_all)]
    async fn list(&self) -> ScenarioResult<Vec<ScenarioDefinition>> {
        let records = match self {
            Self::Remote { url, http } => Self::fetch_remote(url, http).await?,
            Self::Cluster { client } => Self::fetch_cluster(client).await?,
        };
        Ok(parse_records(records))
    }
}

/// Converts raw catalog entries into scenarios, dropping (and reporting) the
/// ones that don't parse or carry an unusable id.
pub fn parse_records<I>(records: I) -> Vec<ScenarioDefinition>
where
    I: IntoIterator<Item = serde_json::Value>,
{
    records
        .into_iter()
        .enumerate()
        .filter_map(
            |(index, record)| match serde_json::from_value::<ScenarioDefinition>(record) {
                Ok(scenario) => match validate_scenario_id(&scenario.id) {
                    Ok(()) => Some(scenario),
                    Err(err) => {
                        warn!("Skipping scenario #{index}: {err}");
                        None
                    }
                },
                Err(err) => {
                    warn!("Skipping malformed scenario #{index}: {err}");
                    None
                }
            },
        )
        .collect()
}
