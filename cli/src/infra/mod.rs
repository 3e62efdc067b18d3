mod bootstrap;
mod health;

pub use bootstrap::deploy;
pub use health::{check_components, ComponentHealth};

/// An infrastructure piece installed by the playground scripts.
#[derive(Debug, Clone, Copy)]
pub struct Component {
    pub name: &'static str,
    pub release: &'static str,
    pub namespace: &'static str,
    /// Narrows the pods that must be ready, all pods of the namespace otherwise
    pub selector: Option<&'static str>,
}

pub const COMPONENTS: [Component; 3] = [
    Component {
        name: "cert-manager",
        release: "cert-manager",
        namespace: "cert-manager",
        selector: None,
    },
    Component {
        name: "ingress-controller",
        release: "ingress-nginx",
        namespace: "ingress-nginx",
        selector: Some("app.kubernetes.io/name=ingress-nginx"),
    },
    Component {
        name: "keycloak",
        release: "sso",
        namespace: "sso",
        selector: None,
    },
];
