use chrono::prelude::*;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The singleton `ActiveScenario` is always stored under this name, whatever
/// scenario it refers to.
pub const ACTIVE_SCENARIO_NAME: &str = "current-playground-scenario";

#[derive(CustomResource, Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "devopsbeerer.io",
    version = "v1alpha1",
    kind = "ActiveScenario",
    root = "ActiveScenarioResource",
    plural = "activescenarios",
    shortname = "as",
    status = "ActiveScenarioStatus",
    printcolumn = r#"{"name":"Scenario","type":"string","jsonPath":".spec.scenarioId"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ActiveScenarioSpec {
    pub scenario_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveScenarioStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm_release_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    JsonSchema,
    strum::Display,
    strum::EnumString,
)]
pub enum Phase {
    Pending,
    Deploying,
    Running,
    Failed,
    Terminating,
}

impl Phase {
    /// Position on the forward-only install path, `None` off that path.
    fn progress(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Deploying => Some(1),
            Self::Running => Some(2),
            Self::Failed | Self::Terminating => None,
        }
    }

    pub fn can_transition_to(self, next: Phase) -> bool {
        match next {
            Self::Terminating => true,
            Self::Failed => matches!(self, Self::Pending | Self::Deploying | Self::Running | Self::Failed),
            _ => match (self.progress(), next.progress()) {
                (Some(cur), Some(next)) => next >= cur,
                _ => false,
            },
        }
    }
}

/// What the tool knows about the currently installed scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveScenarioRecord {
    pub scenario_id: String,
    pub scenario_name: Option<String>,
    pub phase: Phase,
    pub helm_release_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub last_transition_time: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl ActiveScenarioRecord {
    pub fn display_name(&self) -> &str {
        self.scenario_name.as_deref().unwrap_or(&self.scenario_id)
    }

    pub fn status(&self) -> ActiveScenarioStatus {
        ActiveScenarioStatus {
            phase: Some(self.phase),
            helm_release_name: self.helm_release_name.clone(),
            scenario_name: self.scenario_name.clone(),
            start_time: self.start_time,
            last_transition_time: self.last_transition_time,
            message: self.message.clone(),
        }
    }
}

impl From<&ActiveScenarioResource> for ActiveScenarioRecord {
    fn from(resource: &ActiveScenarioResource) -> Self {
        let status = resource.status.clone().unwrap_or_default();
        Self {
            scenario_id: resource.spec.scenario_id.clone(),
            scenario_name: status.scenario_name,
            // A record whose status was never written is an install that
            // hasn't started yet.
            phase: status.phase.unwrap_or(Phase::Pending),
            helm_release_name: status.helm_release_name,
            start_time: status.start_time,
            last_transition_time: status.last_transition_time,
            message: status.message,
        }
    }
}

impl From<&ActiveScenarioRecord> for ActiveScenarioResource {
    fn from(record: &ActiveScenarioRecord) -> Self {
        let mut resource = ActiveScenarioResource::new(
            ACTIVE_SCENARIO_NAME,
            ActiveScenarioSpec {
                scenario_id: record.scenario_id.clone(),
            },
        );
        resource.status = Some(record.status());
        resource
    }
}

#[test]
fn test_phase_transitions() {
    use Phase::*;

    assert!(Pending.can_transition_to(Deploying));
    assert!(Pending.can_transition_to(Running));
    assert!(Deploying.can_transition_to(Running));
    assert!(Running.can_transition_to(Running));

    assert!(!Running.can_transition_to(Pending));
    assert!(!Running.can_transition_to(Deploying));
    assert!(!Deploying.can_transition_to(Pending));

    assert!(Pending.can_transition_to(Failed));
    assert!(Running.can_transition_to(Failed));
    assert!(!Failed.can_transition_to(Running));
    assert!(Failed.can_transition_to(Terminating));

    assert!(Running.can_transition_to(Terminating));
    assert!(!Terminating.can_transition_to(Pending));
    assert!(!Terminating.can_transition_to(Failed));
}

#[test]
fn test_phase_serialization() {
    assert_eq!(
        serde_json::to_value(Phase::Deploying).unwrap(),
        serde_json::json!("Deploying")
    );
    assert_eq!(Phase::Terminating.to_string(), "Terminating");
}
