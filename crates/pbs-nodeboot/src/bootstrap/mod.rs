pub mod plan;
pub mod runner;

use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

use crate::bootstrap::plan::{BootstrapPlan, BootstrapStep};
use crate::bootstrap::runner::{CommandRunner, Invocation, SPAWN_FAILURE_CODE};
use crate::manager::package::PackageManager;
use crate::manager::qmgr::QmgrDirective;

#[derive(Clone, Debug, Default)]
pub struct ExecuteOptions {
    /// Stop after the first step that fails.
    pub fail_fast: bool,
    /// Query the scheduler with `list node` and do not create a node that already exists.
    pub skip_existing: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum StepStatus {
    Succeeded,
    Failed { code: i32, stderr: String },
    SpawnFailed { error: String },
    Skipped { reason: String },
}

impl StepStatus {
    /// Exit code of the step, `None` if no command was executed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StepStatus::Succeeded => Some(0),
            StepStatus::Failed { code, .. } => Some(*code),
            StepStatus::SpawnFailed { .. } => Some(SPAWN_FAILURE_CODE),
            StepStatus::Skipped { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            StepStatus::Failed { .. } | StepStatus::SpawnFailed { .. }
        )
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StepOutcome {
    pub step: BootstrapStep,
    pub command: String,
    pub status: StepStatus,
    #[serde(serialize_with = "serialize_duration_secs")]
    pub duration: Duration,
}

#[derive(Clone, Debug, Serialize)]
pub struct BootstrapReport {
    pub hostname: String,
    pub outcomes: Vec<StepOutcome>,
}

impl BootstrapReport {
    /// Exit code of the last step that actually ran a command, zero if nothing ran.
    pub fn exit_code(&self) -> i32 {
        self.outcomes
            .iter()
            .rev()
            .find_map(|outcome| outcome.status.exit_code())
            .unwrap_or(0)
    }

    pub fn failed_steps(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status.is_failure())
            .count()
    }
}

fn serialize_duration_secs<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

fn run_invocation(runner: &mut dyn CommandRunner, invocation: &Invocation) -> StepStatus {
    match runner.run(invocation) {
        Ok(output) if output.success() => StepStatus::Succeeded,
        Ok(output) => StepStatus::Failed {
            code: output.shell_code(),
            stderr: output.stderr,
        },
        Err(error) => StepStatus::SpawnFailed {
            error: error.to_string(),
        },
    }
}

/// Returns true if the scheduler already knows a node called `name`.
/// Only the exit status of `qmgr` is inspected.
fn node_exists(runner: &mut dyn CommandRunner, plan: &BootstrapPlan, name: &str) -> bool {
    let list = QmgrDirective::ListNode {
        name: name.to_string(),
    }
    .invocation(plan.qmgr());
    match runner.run(&list) {
        Ok(output) => output.success(),
        Err(error) => {
            log::debug!("Cannot list node {name}: {error}");
            false
        }
    }
}

/// Executes the steps of `plan` one by one.
///
/// A failing step does not stop the execution unless `fail_fast` is set; the failure is
/// only recorded in the returned report.
pub fn execute_plan(
    plan: &BootstrapPlan,
    runner: &mut dyn CommandRunner,
    options: &ExecuteOptions,
) -> BootstrapReport {
    let hostname = gethostname::gethostname().to_string_lossy().into_owned();
    log::info!(
        "Bootstrapping PBS node on {hostname} ({} steps)",
        plan.steps().len()
    );

    let mut outcomes = Vec::with_capacity(plan.steps().len());
    let mut stopped = false;

    for (index, step) in plan.steps().iter().enumerate() {
        let invocation = plan.invocation(step);
        let command = plan.command_line(step);

        if stopped {
            outcomes.push(StepOutcome {
                step: step.clone(),
                command,
                status: StepStatus::Skipped {
                    reason: "a previous step failed".to_string(),
                },
                duration: Duration::ZERO,
            });
            continue;
        }

        log::info!("[{}/{}] {step}", index + 1, plan.steps().len());
        let start = Instant::now();

        let status = match step {
            BootstrapStep::CreateNode { name }
                if options.skip_existing && node_exists(runner, plan, name) =>
            {
                log::info!("Node {name} already exists, skipping creation");
                StepStatus::Skipped {
                    reason: format!("node {name} already exists"),
                }
            }
            _ => match &invocation {
                Some(invocation) => run_invocation(runner, invocation),
                None => StepStatus::SpawnFailed {
                    error: PackageManager::not_found().to_string(),
                },
            },
        };

        match &status {
            StepStatus::Failed { code, stderr } => {
                log::warn!("`{command}` failed with exit code {code}");
                if !stderr.is_empty() {
                    log::warn!("Stderr: {stderr}");
                }
            }
            StepStatus::SpawnFailed { error } => {
                log::warn!("Cannot execute `{command}`: {error}");
            }
            StepStatus::Succeeded | StepStatus::Skipped { .. } => {}
        }

        if status.is_failure() && options.fail_fast {
            log::warn!("Stopping bootstrap after a failed step");
            stopped = true;
        }

        outcomes.push(StepOutcome {
            step: step.clone(),
            command,
            status,
            duration: start.elapsed(),
        });
    }

    let report = BootstrapReport { hostname, outcomes };
    match report.failed_steps() {
        0 => log::info!("Bootstrap finished"),
        failed => log::warn!(
            "Bootstrap finished with {failed} failed {}",
            crate::common::utils::str::pluralize("step", failed)
        ),
    }
    report
}
