use anyhow::Result;
use dbeerer_scenarios::{ActiveScenarioResource, ScenarioDefinitionResource};
use kube::CustomResourceExt;

pub fn print() -> Result<()> {
    for crd in [
        ScenarioDefinitionResource::crd(),
        ActiveScenarioResource::crd(),
    ] {
        print!("---\n{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}
