//! Application service — package-manager detection cascade.
//!
//! Four strategies run in fixed priority order; the first that identifies a
//! package manager short-circuits the rest. A command that cannot run counts
//! as "this strategy found nothing", so detection never fails.

use std::time::Duration;

use berth_common::DetectionStrategy;
use tracing::{debug, info};

use crate::application::ports::RemoteExecutor;
use crate::domain::Target;
use crate::domain::package_manager::{
    DIRECT_PROBES, Detection, FILESYSTEM_MARKERS, RELEASE_FILES, StrategyOutcome, classify_image,
    classify_release, path_exists_command, probe_command, read_file_command,
};

/// Strategy priority.
pub const STRATEGY_ORDER: [DetectionStrategy; 4] = [
    DetectionStrategy::DirectProbe,
    DetectionStrategy::ReleaseFile,
    DetectionStrategy::ImageName,
    DetectionStrategy::Filesystem,
];

/// Detect the package manager of `target`.
///
/// Every command is bounded by `probe_timeout`; the result is `unknown`
/// with no strategy when all four come up empty.
pub async fn detect(
    executor: &impl RemoteExecutor,
    target: &Target,
    probe_timeout: Duration,
) -> Detection {
    for strategy in STRATEGY_ORDER {
        let outcome = match strategy {
            DetectionStrategy::DirectProbe => direct_probe(executor, target, probe_timeout).await,
            DetectionStrategy::ReleaseFile => release_file(executor, target, probe_timeout).await,
            DetectionStrategy::ImageName => image_name(target),
            DetectionStrategy::Filesystem => filesystem(executor, target, probe_timeout).await,
        };
        match outcome {
            StrategyOutcome::Found(kind) => {
                info!(container = %target.name, %kind, %strategy, "package manager detected");
                return Detection::found(kind, strategy);
            }
            StrategyOutcome::Inconclusive(errors) => {
                debug!(container = %target.name, %strategy, ?errors, "strategy inconclusive");
            }
            StrategyOutcome::Empty => {
                debug!(container = %target.name, %strategy, "strategy found nothing");
            }
        }
    }
    info!(container = %target.name, "package manager unknown");
    Detection::unknown()
}

/// Strategy 1: `<binary> --version` for each manager; first exit 0 wins.
pub async fn direct_probe(
    executor: &impl RemoteExecutor,
    target: &Target,
    probe_timeout: Duration,
) -> StrategyOutcome {
    let mut errors = Vec::new();
    for (kind, binary) in DIRECT_PROBES {
        let command = probe_command(binary);
        match executor
            .exec_with_timeout(target, &command, false, probe_timeout)
            .await
        {
            Ok(result) if result.success() => return StrategyOutcome::Found(kind),
            Ok(_) => {}
            Err(e) => errors.push(format!("{command}: {e:#}")),
        }
    }
    settle(errors)
}

/// Strategy 2: read the release files; first file that classifies wins.
pub async fn release_file(
    executor: &impl RemoteExecutor,
    target: &Target,
    probe_timeout: Duration,
) -> StrategyOutcome {
    let mut errors = Vec::new();
    for path in RELEASE_FILES {
        let command = read_file_command(path);
        match executor
            .exec_with_timeout(target, &command, false, probe_timeout)
            .await
        {
            Ok(result) if result.success() => {
                if let Some(kind) = classify_release(path, &result.text()) {
                    return StrategyOutcome::Found(kind);
                }
            }
            Ok(_) => {}
            Err(e) => errors.push(format!("{command}: {e:#}")),
        }
    }
    settle(errors)
}

/// Strategy 3: image reference heuristics. Issues no commands.
#[must_use]
pub fn image_name(target: &Target) -> StrategyOutcome {
    classify_image(&target.image).map_or(StrategyOutcome::Empty, StrategyOutcome::Found)
}

/// Strategy 4: well-known config and state paths; first existing path wins.
pub async fn filesystem(
    executor: &impl RemoteExecutor,
    target: &Target,
    probe_timeout: Duration,
) -> StrategyOutcome {
    let mut errors = Vec::new();
    for (kind, path) in FILESYSTEM_MARKERS {
        let command = path_exists_command(path);
        match executor
            .exec_with_timeout(target, &command, false, probe_timeout)
            .await
        {
            Ok(result) if result.success() => return StrategyOutcome::Found(kind),
            Ok(_) => {}
            Err(e) => errors.push(format!("{command}: {e:#}")),
        }
    }
    settle(errors)
}

fn settle(errors: Vec<String>) -> StrategyOutcome {
    if errors.is_empty() {
        StrategyOutcome::Empty
    } else {
        StrategyOutcome::Inconclusive(errors)
    }
}
