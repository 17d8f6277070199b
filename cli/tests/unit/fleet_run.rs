//! Fleet orchestration over fake ports: resolution, ordering, deadlines and
//! inventory host selection.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use berth_cli::application::ports::{CommandResult, RemoteExecutor};
use berth_cli::application::services::fleet::{
    self, FleetOptions, ItemResult, PoolOptions,
};
use berth_cli::application::services::provision::{Credentials, ProvisionOptions};
use berth_cli::domain::{ProvisionError, Target, group_hosts, hosts_from_report};
use berth_common::{OutcomeKind, PackageManagerKind, TargetResult};

use crate::mocks::{CollectingReporter, FakeExecutor, FakeRuntime, FakeVerifier, container};

fn options(concurrency: usize) -> FleetOptions {
    FleetOptions {
        pool: PoolOptions {
            concurrency,
            deadline: Duration::from_secs(30),
        },
        credentials: Credentials {
            user: "ansible".to_string(),
            password: "ansible123".to_string(),
            port: 22,
            identity: None,
        },
        provision: ProvisionOptions {
            probe_timeout: Duration::from_secs(15),
            settle: Duration::ZERO,
        },
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

/// `web` already runs sshd; `db` is Debian whose install fails.
fn mixed_fleet() -> (FakeRuntime, FakeExecutor) {
    let runtime = FakeRuntime::with(vec![
        container("web", "nginx:alpine", Some("172.17.0.2")),
        container("db", "postgres:16", Some("172.17.0.3")),
    ]);
    let executor = FakeExecutor::new()
        .reply_on("web", "apk --version", 0, "apk-tools 2.14.0")
        .reply_on("web", "pgrep sshd", 0, "17")
        .reply_on("db", "apt-get --version", 0, "apt 2.6.1 (amd64)")
        .reply_on("db", "apt-get update", 100, "E: Unable to fetch some archives");
    (runtime, executor)
}

#[tokio::test]
async fn report_follows_request_order_with_mixed_outcomes() {
    let (runtime, executor) = mixed_fleet();
    let verifier = FakeVerifier::accepting("ansible123");
    let reporter = CollectingReporter::default();

    let run = fleet::run(
        &runtime,
        &executor,
        &verifier,
        &names(&["web", "db"]),
        &options(1),
        &reporter,
    )
    .await
    .expect("runtime reachable");

    let report = &run.report;
    assert_eq!(report.targets.len(), 2);
    assert_eq!(report.targets[0].name, "web");
    assert_eq!(report.targets[0].package_manager, PackageManagerKind::Apk);
    assert_eq!(
        report.targets[0].detailed_outcome(),
        Some(OutcomeKind::AlreadyRunning)
    );
    assert_eq!(report.targets[1].name, "db");
    assert_eq!(report.targets[1].package_manager, PackageManagerKind::Apt);
    assert_eq!(
        report.targets[1].detailed_outcome(),
        Some(OutcomeKind::InstallFailed)
    );
    assert_eq!(report.success_count(), 1);

    let lines = reporter.lines.lock().unwrap().clone();
    assert!(lines.iter().any(|l| l.starts_with("✓ web")), "{lines:?}");
    assert!(lines.iter().any(|l| l.starts_with("! db")), "{lines:?}");
}

#[tokio::test]
async fn concurrent_pool_keeps_request_order() {
    let (runtime, executor) = mixed_fleet();
    let verifier = FakeVerifier::accepting("ansible123");

    let run = fleet::run(
        &runtime,
        &executor,
        &verifier,
        &names(&["db", "web"]),
        &options(4),
        &CollectingReporter::default(),
    )
    .await
    .unwrap();

    let order: Vec<&str> = run.report.targets.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(order, ["db", "web"]);
}

#[tokio::test]
async fn unknown_name_is_reported_and_does_not_stop_the_run() {
    let (runtime, executor) = mixed_fleet();
    let verifier = FakeVerifier::accepting("ansible123");

    let run = fleet::run(
        &runtime,
        &executor,
        &verifier,
        &names(&["ghost", "web"]),
        &options(2),
        &CollectingReporter::default(),
    )
    .await
    .unwrap();

    let ghost = &run.report.targets[0];
    assert_eq!(ghost.name, "ghost");
    assert!(matches!(ghost.result, TargetResult::NotFound { .. }));
    assert!(ghost.container_id.is_none());
    assert!(executor.commands_on("ghost").is_empty());
    assert!(run.report.targets[1].is_success());
}

#[tokio::test]
async fn same_container_by_name_and_id_is_provisioned_once() {
    let (runtime, executor) = mixed_fleet();
    let verifier = FakeVerifier::accepting("ansible123");
    let web_id = runtime.containers[0].id.clone();

    let run = fleet::run(
        &runtime,
        &executor,
        &verifier,
        &names(&["web", &web_id]),
        &options(1),
        &CollectingReporter::default(),
    )
    .await
    .unwrap();

    assert_eq!(run.report.targets.len(), 1);
    assert_eq!(executor.commands_on("web").len(), 2, "probe and sshd check");
}

#[tokio::test]
async fn no_names_means_every_running_container() {
    let mut stopped = container("old", "alpine:3.19", None);
    stopped.status = "exited".to_string();
    let runtime = FakeRuntime::with(vec![
        container("web", "nginx:alpine", Some("172.17.0.2")),
        stopped,
    ]);
    let executor = FakeExecutor::new().reply("pgrep sshd", 0, "17");

    let run = fleet::run(
        &runtime,
        &executor,
        &FakeVerifier::accepting("ansible123"),
        &[],
        &options(2),
        &CollectingReporter::default(),
    )
    .await
    .unwrap();

    assert_eq!(run.report.targets.len(), 1);
    assert_eq!(run.report.targets[0].name, "web");
    assert!(executor.commands_on("old").is_empty());
}

#[tokio::test]
async fn unreachable_runtime_aborts_before_any_target() {
    let executor = FakeExecutor::new();

    let err = fleet::run(
        &FakeRuntime::down(),
        &executor,
        &FakeVerifier::accepting("ansible123"),
        &names(&["web"]),
        &options(1),
        &CollectingReporter::default(),
    )
    .await
    .expect_err("runtime is down");

    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::RuntimeUnavailable(_))
    ));
    assert!(executor.commands_on("web").is_empty());
}

/// Executor whose commands never finish inside a short deadline.
struct StalledExecutor;

impl RemoteExecutor for StalledExecutor {
    async fn exec(&self, target: &Target, command: &str, detach: bool) -> Result<CommandResult> {
        self.exec_with_timeout(target, command, detach, Duration::from_secs(600))
            .await
    }

    async fn exec_with_timeout(
        &self,
        _target: &Target,
        _command: &str,
        _detach: bool,
        _timeout: Duration,
    ) -> Result<CommandResult> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(CommandResult {
            exit_code: 0,
            output: Vec::new(),
        })
    }
}

#[tokio::test]
async fn deadline_marks_target_timed_out() {
    let runtime = FakeRuntime::with(vec![container("slow", "debian:12", Some("10.0.0.9"))]);
    let mut opts = options(1);
    opts.pool.deadline = Duration::from_millis(50);

    let run = fleet::run(
        &runtime,
        &StalledExecutor,
        &FakeVerifier::accepting("ansible123"),
        &names(&["slow"]),
        &opts,
        &CollectingReporter::default(),
    )
    .await
    .unwrap();

    let slow = &run.report.targets[0];
    assert!(matches!(slow.result, TargetResult::TimedOut { .. }));
    assert!(!slow.is_success());
    assert!(run.trails.is_empty());
}

// ── Survey and inventory hosts ───────────────────────────────────────────────

#[tokio::test]
async fn survey_detects_without_provisioning() {
    let (runtime, executor) = mixed_fleet();

    let items = fleet::survey(
        &runtime,
        &executor,
        &names(&["web", "db", "ghost"]),
        options(2).pool,
        Duration::from_secs(15),
        &CollectingReporter::default(),
    )
    .await
    .unwrap();

    assert_eq!(items.len(), 3);
    assert!(matches!(items[2].result, ItemResult::NotFound(_)));
    assert!(
        !executor
            .commands_on("db")
            .iter()
            .any(|c| c.starts_with("apt-get update")),
        "survey must not install"
    );

    let hosts = fleet::survey_hosts(&items);
    let names: Vec<&str> = hosts.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["web", "db"]);
}

#[tokio::test]
async fn inventory_groups_only_successful_addressed_targets() {
    let runtime = FakeRuntime::with(vec![
        container("web", "nginx:alpine", Some("172.17.0.2")),
        container("api", "nginx:alpine", Some("172.17.0.4")),
        container("worker", "alpine:3.19", None),
        container("db", "postgres:16", Some("172.17.0.3")),
    ]);
    let executor = FakeExecutor::new()
        .reply("apk --version", 0, "")
        .reply_on("db", "pgrep sshd", 1, "")
        .reply("pgrep sshd", 0, "17");

    let run = fleet::run(
        &runtime,
        &executor,
        &FakeVerifier::accepting("ansible123"),
        &[],
        &options(3),
        &CollectingReporter::default(),
    )
    .await
    .unwrap();

    // db reaches the apk profile and fails to install (unmatched commands exit 1).
    assert_eq!(run.report.success_count(), 3);
    let groups = group_hosts(hosts_from_report(&run.report));
    let grouped: BTreeMap<_, Vec<&str>> = groups
        .iter()
        .map(|(k, hosts)| (*k, hosts.iter().map(|h| h.name.as_str()).collect()))
        .collect();
    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped[&PackageManagerKind::Apk], ["web", "api"]);
}
