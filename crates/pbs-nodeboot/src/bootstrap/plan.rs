use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bootstrap::runner::Invocation;
use crate::common::config::BootstrapConfig;
use crate::common::utils::str::shell_join;
use crate::manager::package::PackageManager;
use crate::manager::qmgr::QmgrDirective;

/// Placeholder shown instead of the program of an install step that has no package manager.
const MISSING_MANAGER: &str = "<package-manager>";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum BootstrapStep {
    InstallPackages {
        /// `None` when no package manager was found on the host.
        manager: Option<PackageManager>,
        packages: Vec<String>,
    },
    CreateNode {
        name: String,
    },
    AssignQueue {
        node: String,
        queue: String,
    },
    SetServerAttribute {
        attribute: String,
        value: String,
    },
}

impl Display for BootstrapStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapStep::InstallPackages { packages, .. } => {
                write!(f, "Install packages {}", packages.join(", "))
            }
            BootstrapStep::CreateNode { name } => write!(f, "Create node {name}"),
            BootstrapStep::AssignQueue { node, queue } => {
                write!(f, "Assign node {node} to queue {queue}")
            }
            BootstrapStep::SetServerAttribute { attribute, value } => {
                write!(f, "Set server attribute {attribute}={value}")
            }
        }
    }
}

/// Ordered list of steps that bootstrap a node.
#[derive(Clone, Debug)]
pub struct BootstrapPlan {
    qmgr: PathBuf,
    steps: Vec<BootstrapStep>,
}

impl BootstrapPlan {
    /// Builds the plan for `config`.
    /// Without a `manager` the install step is kept but cannot be executed, the qmgr
    /// steps are planned regardless.
    pub fn from_config(
        config: &BootstrapConfig,
        manager: Option<PackageManager>,
        qmgr: PathBuf,
    ) -> Self {
        let mut steps = Vec::with_capacity(3 + config.server.attributes.len());

        if !config.packages.is_empty() {
            steps.push(BootstrapStep::InstallPackages {
                manager,
                packages: config.packages.clone(),
            });
        }

        steps.push(BootstrapStep::CreateNode {
            name: config.node.name.clone(),
        });
        steps.push(BootstrapStep::AssignQueue {
            node: config.node.name.clone(),
            queue: config.node.queue.clone(),
        });
        for (attribute, value) in &config.server.attributes {
            steps.push(BootstrapStep::SetServerAttribute {
                attribute: attribute.clone(),
                value: value.to_qmgr_value(),
            });
        }

        Self { qmgr, steps }
    }

    pub fn steps(&self) -> &[BootstrapStep] {
        &self.steps
    }

    pub fn qmgr(&self) -> &Path {
        &self.qmgr
    }

    /// Command executed for `step`, `None` if the step has no runnable command.
    pub fn invocation(&self, step: &BootstrapStep) -> Option<Invocation> {
        let directive = match step {
            BootstrapStep::InstallPackages { manager, packages } => {
                return manager.map(|manager| manager.install_invocation(packages));
            }
            BootstrapStep::CreateNode { name } => QmgrDirective::CreateNode { name: name.clone() },
            BootstrapStep::AssignQueue { node, queue } => QmgrDirective::SetNodeAttribute {
                node: node.clone(),
                attribute: "queue".to_string(),
                value: queue.clone(),
            },
            BootstrapStep::SetServerAttribute { attribute, value } => {
                QmgrDirective::SetServerAttribute {
                    attribute: attribute.clone(),
                    value: value.clone(),
                }
            }
        };
        Some(directive.invocation(&self.qmgr))
    }

    pub fn command_line(&self, step: &BootstrapStep) -> String {
        match (self.invocation(step), step) {
            (Some(invocation), _) => invocation.command_line(),
            (None, BootstrapStep::InstallPackages { packages, .. }) => {
                format!("{MISSING_MANAGER} install {}", shell_join(packages))
            }
            (None, step) => step.to_string(),
        }
    }

    /// Command lines of all steps, in execution order.
    pub fn command_lines(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|step| self.command_line(step))
            .collect()
    }
}
