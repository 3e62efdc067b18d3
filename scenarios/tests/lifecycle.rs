mod utils;

use anyhow::Result;
use dbeerer_scenarios::{InstallOutcome, Phase, ReleaseStatus, ScenarioError};
use maplit::btreemap;
use utils::{harness, record};

#[tokio::test]
async fn test_install() -> Result<()> {
    let h = harness(&["oidc-basic"]);

    let outcome = h.controller.install("oidc-basic", false).await?;
    assert!(matches!(
        outcome,
        InstallOutcome::Installed { scenario, notice: None } if scenario.id == "oidc-basic"
    ));

    let record = h.store.record().expect("No active record");
    assert_eq!(record.scenario_id, "oidc-basic");
    assert_eq!(record.phase, Phase::Running);

    let installs = h.installer.installs();
    assert_eq!(installs.len(), 1);
    assert_eq!(installs[0].release, "devopsbeerer-oidc-basic");
    assert_eq!(installs[0].namespace, "devopsbeerer-oidc-basic");
    assert_eq!(
        installs[0].values,
        btreemap! { "scenario.id".to_owned() => "oidc-basic".to_owned() }
    );
    assert!(installs[0].chart_present);

    let resolved = h.resolver.resolved();
    assert_eq!(resolved.len(), 1);
    assert!(!resolved[0].exists(), "Chart bundle was not cleaned up");
    Ok(())
}

#[tokio::test]
async fn test_install_same_scenario_twice() -> Result<()> {
    let h = harness(&["oidc-basic"]);
    h.controller.install("oidc-basic", false).await?;

    let outcome = h.controller.install("oidc-basic", false).await?;
    assert!(matches!(outcome, InstallOutcome::AlreadyActive(_)));
    assert_eq!(h.installer.installs().len(), 1);
    assert!(h.installer.uninstalls().is_empty());
    assert_eq!(h.store.record().unwrap().phase, Phase::Running);
    Ok(())
}

#[tokio::test]
async fn test_install_unknown_scenario() {
    let h = harness(&["oidc-basic"]);

    let err = h.controller.install("saml", false).await.unwrap_err();
    assert!(matches!(err, ScenarioError::ScenarioNotFound(id) if id == "saml"));
    assert!(h.store.record().is_none());
    assert!(h.resolver.resolved().is_empty());
}

#[tokio::test]
async fn test_install_invalid_id() {
    let h = harness(&["oidc-basic"]);

    let err = h.controller.install("OIDC_Basic", false).await.unwrap_err();
    assert!(matches!(err, ScenarioError::InvalidScenarioId(_)));
}

#[tokio::test]
async fn test_switch_scenario() -> Result<()> {
    let h = harness(&["first", "second"]);
    h.controller.install("first", false).await?;

    h.controller.install("second", false).await?;

    assert_eq!(
        h.installer.uninstalls(),
        vec![(
            "devopsbeerer-first".to_owned(),
            "devopsbeerer-first".to_owned()
        )]
    );
    assert_eq!(h.installer.deleted_namespaces(), vec!["devopsbeerer-first"]);
    let record = h.store.record().unwrap();
    assert_eq!(record.scenario_id, "second");
    assert_eq!(record.phase, Phase::Running);
    Ok(())
}

#[tokio::test]
async fn test_switch_scenario_despite_uninstall_failure() -> Result<()> {
    let h = harness(&["first", "second"]);
    h.controller.install("first", false).await?;
    h.installer.fail_uninstall();

    h.controller.install("second", false).await?;

    assert_eq!(h.store.record().unwrap().scenario_id, "second");
    Ok(())
}

#[tokio::test]
async fn test_resolution_failure_removes_record() {
    let h = harness(&["oidc-basic"]);
    h.resolver.chart_missing();

    let err = h.controller.install("oidc-basic", false).await.unwrap_err();
    assert!(matches!(err, ScenarioError::ChartNotFound { .. }));
    assert!(h.store.record().is_none());
    assert!(h.installer.installs().is_empty());
}

#[tokio::test]
async fn test_install_failure_removes_record_and_chart() {
    let h = harness(&["oidc-basic"]);
    h.installer.fail_install();

    let err = h.controller.install("oidc-basic", false).await.unwrap_err();
    assert!(matches!(err, ScenarioError::InstallFailed(release, _) if release == "devopsbeerer-oidc-basic"));
    assert!(h.store.record().is_none());

    let resolved = h.resolver.resolved();
    assert_eq!(resolved.len(), 1);
    assert!(!resolved[0].exists(), "Chart bundle was not cleaned up");
}

#[tokio::test]
async fn test_install_reports_chart_notice() -> Result<()> {
    let h = harness(&["oidc-basic"]);
    h.resolver.notice("templates/ was not downloaded");

    let outcome = h.controller.install("oidc-basic", false).await?;
    assert!(matches!(
        outcome,
        InstallOutcome::Installed { notice: Some(notice), .. } if notice == "templates/ was not downloaded"
    ));

    let record = h.store.record().expect("No active record");
    assert_eq!(record.phase, Phase::Running);
    assert_eq!(
        record.message.as_deref(),
        Some("templates/ was not downloaded")
    );
    Ok(())
}

#[tokio::test]
async fn test_install_keeps_record_replaced_by_another_client() {
    let h = harness(&["oidc-basic"]);
    let store = h.store.clone();
    h.installer
        .during_install(move || store.put(record("saml", Phase::Running)));

    let err = h.controller.install("oidc-basic", false).await.unwrap_err();
    assert!(matches!(err, ScenarioError::ConcurrentModification));

    let record = h.store.record().expect("Record of the other client was deleted");
    assert_eq!(record.scenario_id, "saml");
    assert_eq!(record.phase, Phase::Running);
}

#[tokio::test]
async fn test_uninstall_leaves_replaced_record_alone() -> Result<()> {
    let h = harness(&["oidc-basic"]);
    h.controller.install("oidc-basic", false).await?;
    h.store.race();

    let err = h.controller.uninstall().await.unwrap_err();
    assert!(matches!(err, ScenarioError::ConcurrentModification));
    assert!(h.installer.uninstalls().is_empty());
    assert_eq!(h.store.record().unwrap().scenario_id, "oidc-basic");
    Ok(())
}

#[tokio::test]
async fn test_uninstall() -> Result<()> {
    let h = harness(&["oidc-basic"]);
    h.controller.install("oidc-basic", false).await?;

    let removed = h.controller.uninstall().await?;
    assert_eq!(removed.scenario_id, "oidc-basic");
    assert!(h.store.record().is_none());
    assert_eq!(h.installer.uninstalls().len(), 1);
    assert_eq!(
        h.installer.deleted_namespaces(),
        vec!["devopsbeerer-oidc-basic"]
    );
    Ok(())
}

#[tokio::test]
async fn test_uninstall_survives_helm_failure() -> Result<()> {
    let h = harness(&["oidc-basic"]);
    h.controller.install("oidc-basic", false).await?;
    h.installer.fail_uninstall();

    h.controller.uninstall().await?;
    assert!(h.store.record().is_none());
    assert_eq!(
        h.installer.deleted_namespaces(),
        vec!["devopsbeerer-oidc-basic"]
    );

    // Nothing blocks the next install
    h.controller.install("oidc-basic", false).await?;
    assert_eq!(h.store.record().unwrap().phase, Phase::Running);
    Ok(())
}

#[tokio::test]
async fn test_uninstall_without_active_scenario() {
    let h = harness(&["oidc-basic"]);

    let err = h.controller.uninstall().await.unwrap_err();
    assert!(matches!(err, ScenarioError::NoActiveScenario));
    assert!(h.installer.uninstalls().is_empty());
}

#[tokio::test]
async fn test_interrupted_install_requires_force() -> Result<()> {
    let h = harness(&["oidc-basic"]);
    h.store.put(record("oidc-basic", Phase::Deploying));

    let err = h.controller.install("oidc-basic", false).await.unwrap_err();
    assert!(matches!(
        err,
        ScenarioError::StaleScenario {
            phase: Phase::Deploying,
            ..
        }
    ));
    assert_eq!(h.store.record().unwrap().phase, Phase::Deploying);
    assert!(h.installer.installs().is_empty());

    let outcome = h.controller.install("oidc-basic", true).await?;
    assert!(matches!(outcome, InstallOutcome::Installed { .. }));
    assert_eq!(h.installer.uninstalls().len(), 1);
    assert_eq!(h.store.record().unwrap().phase, Phase::Running);
    Ok(())
}

#[tokio::test]
async fn test_at_most_one_active_scenario() -> Result<()> {
    let h = harness(&["a", "b", "c"]);

    let steps: [(&str, Option<&str>); 5] = [
        ("a", Some("a")),
        ("b", Some("b")),
        ("a", Some("a")),
        ("stop", None),
        ("c", Some("c")),
    ];
    for (step, expected) in steps {
        if step == "stop" {
            h.controller.uninstall().await?;
        } else {
            h.controller.install(step, false).await?;
        }
        let active = h.store.record().map(|record| record.scenario_id);
        assert_eq!(active.as_deref(), expected, "after step {step}");
    }

    // Each switch and the stop removed the previous release
    let uninstalled: Vec<String> = h
        .installer
        .uninstalls()
        .into_iter()
        .map(|(release, _)| release)
        .collect();
    assert_eq!(
        uninstalled,
        vec!["devopsbeerer-a", "devopsbeerer-b", "devopsbeerer-a"]
    );
    Ok(())
}

#[tokio::test]
async fn test_status() -> Result<()> {
    let h = harness(&["oidc-basic"]);
    assert_eq!(h.controller.status().await?, None);

    h.controller.install("oidc-basic", false).await?;
    let status = h.controller.status().await?.expect("No status");
    assert_eq!(status.record.scenario_id, "oidc-basic");
    assert_eq!(status.release, ReleaseStatus::Deployed);
    Ok(())
}
