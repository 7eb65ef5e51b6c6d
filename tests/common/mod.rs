//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use pkgmgr_discovery::{
    CommandExecutor, CommandOutput, PackageDiscovery, SearchEnv, SpawnFailure, UserConfig,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Executor that answers from a script keyed by `"program arg1 arg2"`.
///
/// Anything not scripted behaves like a missing program.
#[derive(Default)]
pub struct FakeExecutor {
    replies: Mutex<HashMap<String, CommandOutput>>,
    calls: Mutex<Vec<String>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, command: &str, output: CommandOutput) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(command.to_string(), output);
        self
    }

    pub fn ok(self, command: &str, stdout: &str) -> Self {
        self.reply(command, CommandOutput::exited(0, stdout, ""))
    }

    pub fn fail(self, command: &str, code: i32, stderr: &str) -> Self {
        self.reply(command, CommandOutput::exited(code, "", stderr))
    }

    /// Number of times `command` was run.
    pub fn count(&self, command: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn execute(&self, program: &str, args: &[&str], _timeout: Duration) -> CommandOutput {
        let key = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(key.clone());
        self.replies
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| CommandOutput::spawn_failed(SpawnFailure::NotFound))
    }
}

/// Facade over `exec` with an empty environment, so only scripted commands
/// and files the test creates can be found.
pub fn discovery(exec: &Arc<FakeExecutor>, config: UserConfig) -> PackageDiscovery {
    let executor: Arc<dyn CommandExecutor> = exec.clone();
    PackageDiscovery::with_parts(executor, SearchEnv::empty(), config)
}

/// Facade over `exec` with an explicit environment snapshot.
pub fn discovery_in(exec: &Arc<FakeExecutor>, env: SearchEnv, config: UserConfig) -> PackageDiscovery {
    let executor: Arc<dyn CommandExecutor> = exec.clone();
    PackageDiscovery::with_parts(executor, env, config)
}

/// Create an executable file standing in for an installed manager.
#[cfg(unix)]
pub fn fake_install(dir: &Path, name: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
