use crate::active::Phase;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Scenario '{0}' not found")]
    ScenarioNotFound(String),

    #[error("Invalid scenario id '{0}': only lowercase letters, digits and '-' are allowed")]
    InvalidScenarioId(String),

    #[error("Chart for scenario '{scenario}' not found: {detail}")]
    ChartNotFound { scenario: String, detail: String },

    #[error("Chart for scenario '{0}' is incomplete: {1}")]
    IncompleteChart(String, String),

    #[error("Failed resolving chart for scenario '{0}': {1}")]
    ResolutionFailed(String, String),

    #[error("Helm install of '{0}' failed: {1}")]
    InstallFailed(String, String),

    #[error("Helm uninstall of '{0}' failed: {1}")]
    UninstallFailed(String, String),

    #[error("Scenario '{0}' is already active")]
    AlreadyActiveSameScenario(String),

    #[error("No active scenario found")]
    NoActiveScenario,

    #[error("Scenario '{scenario_id}' was left in phase {phase} by an interrupted operation; run `start --force` or `stop` to clean it up")]
    StaleScenario { scenario_id: String, phase: Phase },

    #[error("Cannot move active scenario from phase {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("The active scenario was modified concurrently by another client")]
    ConcurrentModification,

    #[error("Failed fetching scenario catalog: {0}")]
    CatalogUnavailable(String),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScenarioError {
    /// Whether the error describes something the user can act on, as opposed
    /// to a transport or local failure.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::Kube(_) | Self::Http(_) | Self::Io(_) | Self::Serialization(_)
        )
    }
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
