mod active;
pub mod catalog;
pub mod chart_source;
pub mod config;
mod definition;
mod error;
pub mod installer;
pub mod lifecycle;
mod naming;
pub mod store;
mod tracker;

pub use active::*;
pub use catalog::{Catalog, ScenarioCatalog};
pub use chart_source::{ChartBundle, ChartResolver, ChartSource, ChartSourceResolver};
pub use definition::*;
pub use error::*;
pub use installer::{Helm, PackageInstaller, ReleaseStatus};
pub use lifecycle::{InstallOutcome, LifecycleController, ScenarioStatus};
pub use naming::*;
pub use store::{ActiveScenarioStore, KubeActiveScenarioStore, Versioned};
pub use tracker::ActiveScenarioTracker;
