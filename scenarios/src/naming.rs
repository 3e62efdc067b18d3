use crate::error::{ScenarioError, ScenarioResult};

pub const DEFAULT_RELEASE_PREFIX: &str = "devopsbeerer";

/// Derives Helm release and namespace names from a scenario id. Nothing else
/// is needed to find a scenario's workload again after a crash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    prefix: String,
}

impl Default for Naming {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASE_PREFIX)
    }
}

impl Naming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn release_name(&self, scenario_id: &str) -> String {
        format!("{}-{}", self.prefix, scenario_id)
    }

    pub fn namespace(&self, scenario_id: &str) -> String {
        format!("{}-{}", self.prefix, scenario_id)
    }
}

/// Scenario ids end up as namespace and release names, so they must be valid
/// DNS labels.
pub fn validate_scenario_id(id: &str) -> ScenarioResult<()> {
    let valid_chars = id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if id.is_empty() || !valid_chars || id.starts_with('-') || id.ends_with('-') {
        return Err(ScenarioError::InvalidScenarioId(id.to_owned()));
    }
    Ok(())
}

#[test]
fn test_naming() {
    let naming = Naming::default();
    assert_eq!(naming.release_name("oidc-basic"), "devopsbeerer-oidc-basic");
    assert_eq!(naming.namespace("oidc-basic"), "devopsbeerer-oidc-basic");
    assert_eq!(
        naming.release_name("oidc-basic"),
        naming.release_name("oidc-basic")
    );

    let naming = Naming::new("lab");
    assert_eq!(naming.namespace("s1"), "lab-s1");
}

#[test]
fn test_validate_scenario_id() {
    assert!(validate_scenario_id("scenario-1").is_ok());
    assert!(validate_scenario_id("abc123").is_ok());

    assert!(validate_scenario_id("").is_err());
    assert!(validate_scenario_id("Scenario").is_err());
    assert!(validate_scenario_id("under_score").is_err());
    assert!(validate_scenario_id("-leading").is_err());
    assert!(validate_scenario_id("trailing-").is_err());
    assert!(validate_scenario_id("dot.ted").is_err());
}
