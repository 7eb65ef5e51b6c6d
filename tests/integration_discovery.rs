//! Integration tests for discovery, listing and uninstalling.
//!
//! Every command goes through a scripted executor, so these tests pass
//! regardless of which package managers the host has installed.

mod common;

use common::{discovery, discovery_in, FakeExecutor};
use pkgmgr_discovery::{
    CommandOutput, DiscoveryError, DiscoveryMethod, ListProgress, ManagerId, ManagerState,
    PackageLocation, ProbeState, SearchEnv, SpawnFailure, UserConfig,
};
use std::sync::{Arc, Mutex};

fn disabled_except(keep: &[ManagerId]) -> UserConfig {
    UserConfig {
        disabled: ManagerId::all().filter(|m| !keep.contains(m)).collect(),
        ..UserConfig::default()
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_off_path_install_found_through_custom_path() {
    let dir = tempfile::tempdir().unwrap();
    let brew = common::fake_install(dir.path(), "brew");
    let brew_str = brew.to_string_lossy().into_owned();

    let exec = Arc::new(
        FakeExecutor::new()
            .ok(&format!("{brew_str} --version"), "Homebrew 4.2.5\n")
            .ok(&format!("{brew_str} list --versions"), "wget 1.21.4\ngit 2.43.0 2.42.1\n")
            .fail(&format!("{brew_str} list --cask --versions"), 1, "Error: casks are macOS only"),
    );
    let config = UserConfig::from_json(
        &serde_json::json!({ "customPaths": { "homebrew": [brew_str] } }).to_string(),
    )
    .unwrap();
    let d = discovery(&exec, config);

    let status = d.get_manager_status(ManagerId::Homebrew).await.unwrap();
    assert_eq!(status.status, ManagerState::PathMissing);
    assert_eq!(status.discovery_method, Some(DiscoveryMethod::CustomPath));
    assert_eq!(status.found_path.as_deref(), Some(brew.as_path()));
    assert!(!status.in_path);
    assert!(status.message.as_deref().unwrap().contains("not on PATH"));
    assert_eq!(status.version, Some(semver::Version::new(4, 2, 5)));

    let packages = d.list_packages(ManagerId::Homebrew).await.unwrap();
    assert_eq!(packages.len(), 2);
    assert_eq!(packages[1].name(), "git");
    assert_eq!(packages[1].version(), "2.43.0 2.42.1");
    assert!(packages.iter().all(|p| p.location() == PackageLocation::Formula));
}

#[cfg(unix)]
#[tokio::test]
async fn test_homebrew_off_path_common_location() {
    let prefix = tempfile::tempdir().unwrap();
    let bin = prefix.path().join("opt/homebrew/bin");
    std::fs::create_dir_all(&bin).unwrap();
    let brew = common::fake_install(&bin, "brew");

    let exec = Arc::new(FakeExecutor::new().ok(
        &format!("{} --version", brew.display()),
        "Homebrew 4.2.5",
    ));
    let env = SearchEnv::empty().with_var(
        "HOMEBREW_PREFIX",
        prefix.path().join("opt/homebrew").to_string_lossy(),
    );
    let d = discovery_in(&exec, env, UserConfig::default());

    let statuses = d.discover_available_managers().await;
    let status = statuses
        .iter()
        .find(|s| s.manager == ManagerId::Homebrew)
        .unwrap();
    assert_eq!(status.status, ManagerState::PathMissing);
    assert_eq!(status.discovery_method, Some(DiscoveryMethod::CommonPath));
    assert!(!status.in_path);
    assert_eq!(status.found_path.as_deref(), Some(brew.as_path()));
    assert_eq!(exec.count("brew --version"), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_refused_executable_reports_permission_denied() {
    let dir = tempfile::tempdir().unwrap();
    let conda = common::fake_install(dir.path(), "conda");
    let conda_str = conda.to_string_lossy().into_owned();

    let exec = Arc::new(FakeExecutor::new().reply(
        &format!("{conda_str} --version"),
        CommandOutput::spawn_failed(SpawnFailure::PermissionDenied),
    ));
    let config = UserConfig::from_json(
        &serde_json::json!({ "customPaths": { "conda": [conda_str] } }).to_string(),
    )
    .unwrap();
    let d = discovery(&exec, config);

    let status = d.get_manager_status(ManagerId::Conda).await.unwrap();
    assert_ne!(status.status, ManagerState::NotInstalled);
    assert!(status.permission_denied);
    assert!(status.message.as_deref().unwrap().contains("permission was denied"));

    assert_eq!(
        d.list_packages(ManagerId::Conda).await.unwrap_err(),
        DiscoveryError::PermissionDenied {
            manager: ManagerId::Conda,
            path: conda.clone(),
        }
    );
    assert!(matches!(
        d.uninstall_package("numpy", ManagerId::Conda).await,
        Err(DiscoveryError::PermissionDenied { .. })
    ));

    let listing = d.list_all_packages(|_| {}).await;
    assert!(listing.failures[&ManagerId::Conda].contains("Permission denied"));
    assert!(!listing.unavailable.contains(&ManagerId::Conda));
}

#[tokio::test]
async fn test_conda_listing() {
    let exec = Arc::new(
        FakeExecutor::new()
            .ok("conda --version", "conda 24.1.2")
            .ok(
                "conda list --json",
                r#"[{"name":"numpy","version":"1.26.4","channel":"conda-forge"},
                    {"name":"python","version":"3.12.2","channel":"conda-forge"}]"#,
            ),
    );
    let d = discovery(&exec, UserConfig::default());

    let packages = d.list_packages(ManagerId::Conda).await.unwrap();
    assert_eq!(packages.len(), 2);
    assert_eq!(packages[0].name(), "numpy");
    assert_eq!(packages[0].version(), "1.26.4");
    assert_eq!(packages[0].channel(), Some("conda-forge"));
    assert_eq!(packages[0].location(), PackageLocation::CondaEnv);
}

#[tokio::test]
async fn test_pyenv_versions_and_empty_pipx() {
    let exec = Arc::new(
        FakeExecutor::new()
            .ok("pyenv --version", "pyenv 2.3.36")
            .ok("pyenv versions --bare", "3.11.7\n3.12.1\nsystem\n")
            .ok("pipx --version", "1.4.3")
            .ok("pipx list --json", r#"{"pipx_spec_version": "0.1", "venvs": {}}"#),
    );
    let d = discovery(&exec, UserConfig::default());

    let versions = d.list_packages(ManagerId::Pyenv).await.unwrap();
    let names: Vec<_> = versions.iter().map(|v| (v.name(), v.version())).collect();
    assert_eq!(names, vec![("python", "3.11.7"), ("python", "3.12.1")]);

    assert!(d.list_packages(ManagerId::Pipx).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_all_isolates_failing_manager() {
    let exec = Arc::new(
        FakeExecutor::new()
            .ok("pyenv --version", "pyenv 2.3.36")
            .ok("pyenv versions --bare", "3.12.1\n")
            .ok("conda --version", "conda 24.1.2")
            .fail("conda list --json", 1, "CondaError: environment corrupted")
            .ok("pipx --version", "1.4.3")
            .reply("pipx list --json", CommandOutput::timed_out()),
    );
    let d = discovery(
        &exec,
        disabled_except(&[ManagerId::Pyenv, ManagerId::Conda, ManagerId::Pipx, ManagerId::Gem]),
    );

    let events = Mutex::new(Vec::new());
    let listing = d.list_all_packages(|p| events.lock().unwrap().push(p)).await;

    assert_eq!(listing.packages.len(), 1);
    assert_eq!(listing.packages[0].manager(), ManagerId::Pyenv);
    assert_eq!(listing.unavailable, vec![ManagerId::Gem]);
    assert!(listing.failures[&ManagerId::Conda].contains("environment corrupted"));
    assert!(listing.failures.contains_key(&ManagerId::Pipx));

    let events = events.into_inner().unwrap();
    for manager in [ManagerId::Pyenv, ManagerId::Conda, ManagerId::Pipx] {
        let seen: Vec<_> = events.iter().filter(|e| e.manager() == manager).collect();
        assert_eq!(seen.len(), 2, "{manager}: {seen:?}");
        assert!(matches!(seen[0], ListProgress::Started { .. }));
        assert!(seen[1].is_finished());
    }
    assert!(events.iter().all(|e| e.manager() != ManagerId::Gem));
}

#[tokio::test]
async fn test_disabled_managers_never_probed_or_reported() {
    let exec = Arc::new(FakeExecutor::new().ok("conda --version", "conda 24.1.2"));
    let config = UserConfig::from_json(r#"{"disabled": ["conda", "brew"]}"#).unwrap();
    let d = discovery(&exec, config);

    let statuses = d.discover_available_managers().await;
    assert!(statuses
        .iter()
        .all(|s| s.manager != ManagerId::Conda && s.manager != ManagerId::Homebrew));
    assert_eq!(exec.count("conda --version"), 0);

    let listing = d.list_all_packages(|_| {}).await;
    assert!(!listing.unavailable.contains(&ManagerId::Conda));
    assert!(matches!(
        d.list_packages(ManagerId::Conda).await,
        Err(DiscoveryError::Disabled { .. })
    ));
}

#[tokio::test]
async fn test_discovery_probes_once_per_session() {
    let exec = Arc::new(FakeExecutor::new().ok("pyenv --version", "pyenv 2.3.36"));
    let d = discovery(&exec, disabled_except(&[ManagerId::Pyenv]));

    let first = d.discover_available_managers().await;
    let second = d.discover_available_managers().await;
    assert_eq!(first, second);
    assert_eq!(exec.count("pyenv --version"), 1);
    assert!(matches!(d.probe_state(ManagerId::Pyenv), ProbeState::Resolved(_)));

    d.reset();
    d.discover_available_managers().await;
    assert_eq!(exec.count("pyenv --version"), 2);
}

#[tokio::test]
async fn test_uninstall_routes_to_manager() {
    let exec = Arc::new(
        FakeExecutor::new()
            .ok("conda --version", "conda 24.1.2")
            .ok("conda remove -y numpy", "")
            .ok("poetry --version", "Poetry (version 1.7.1)"),
    );
    let d = discovery(&exec, UserConfig::default());

    d.uninstall_package("numpy", ManagerId::Conda).await.unwrap();
    assert_eq!(exec.count("conda remove -y numpy"), 1);

    assert!(matches!(
        d.uninstall_package("--all", ManagerId::Conda).await,
        Err(DiscoveryError::InvalidPackageName { .. })
    ));
    assert!(matches!(
        d.uninstall_package("myproject-abc", ManagerId::Poetry).await,
        Err(DiscoveryError::Unsupported { .. })
    ));
    assert!(matches!(
        d.uninstall_package("rake", ManagerId::Gem).await,
        Err(DiscoveryError::NotInstalled { .. })
    ));
}

#[tokio::test]
async fn test_uninstall_failure_carries_stderr() {
    let exec = Arc::new(
        FakeExecutor::new()
            .ok("pipx --version", "1.4.3")
            .fail("pipx uninstall black", 1, "Nothing to uninstall for black\n"),
    );
    let d = discovery(&exec, UserConfig::default());

    let err = d.uninstall_package("black", ManagerId::Pipx).await.unwrap_err();
    match err {
        DiscoveryError::CommandFailed { stderr, .. } => {
            assert_eq!(stderr, "Nothing to uninstall for black")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
