use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const API_GROUP: &str = "devopsbeerer.io";
pub const API_VERSION: &str = "v1alpha1";

/// An installable scenario, as published by the catalog. The same shape is
/// used for entries of the remote metadata document and for the spec of the
/// cluster-scoped `ScenarioDefinition` resource.
#[derive(CustomResource, Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "devopsbeerer.io",
    version = "v1alpha1",
    kind = "ScenarioDefinition",
    root = "ScenarioDefinitionResource",
    plural = "scenariodefinitions"
)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub helm_chart: HelmChartRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct HelmChartRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl ScenarioDefinition {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Git repository hosting the chart, if the scenario declares one.
    pub fn repository_link(&self) -> Option<&str> {
        self.helm_chart
            .link
            .as_deref()
            .filter(|link| !link.trim().is_empty())
    }

    /// Directory of the chart inside its repository, the scenario id unless
    /// declared otherwise.
    pub fn chart_directory(&self) -> &str {
        self.helm_chart
            .dir
            .as_deref()
            .map(|dir| dir.trim_matches('/'))
            .filter(|dir| !dir.is_empty())
            .unwrap_or(&self.id)
    }
}

#[test]
fn test_chart_directory() {
    let mut scenario = ScenarioDefinition {
        id: "oidc-basic".to_owned(),
        name: String::new(),
        description: String::new(),
        tags: vec![],
        features: vec![],
        helm_chart: Default::default(),
    };
    assert_eq!(scenario.chart_directory(), "oidc-basic");
    assert_eq!(scenario.display_name(), "oidc-basic");
    assert_eq!(scenario.repository_link(), None);

    scenario.helm_chart.dir = Some("charts/oidc/".to_owned());
    scenario.helm_chart.link = Some(" ".to_owned());
    assert_eq!(scenario.chart_directory(), "charts/oidc");
    assert_eq!(scenario.repository_link(), None);
}
