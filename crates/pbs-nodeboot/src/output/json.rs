use serde::Serialize;
use serde_json::json;

use crate::bootstrap::BootstrapReport;
use crate::bootstrap::plan::BootstrapPlan;
use crate::output::outputs::Output;

#[derive(Default)]
pub struct JsonOutput;

impl JsonOutput {
    fn print<T: Serialize>(&self, data: &T) {
        match serde_json::to_string_pretty(data) {
            Ok(text) => println!("{text}"),
            Err(error) => log::error!("Cannot serialize JSON output: {error:?}"),
        }
    }
}

impl Output for JsonOutput {
    fn print_plan(&self, plan: &BootstrapPlan) {
        let steps: Vec<_> = plan
            .steps()
            .iter()
            .map(|step| {
                json!({
                    "step": step,
                    "command": plan.invocation(step),
                    "command_line": plan.command_line(step),
                })
            })
            .collect();
        self.print(&json!({
            "qmgr": plan.qmgr(),
            "steps": steps,
        }));
    }

    fn print_report(&self, report: &BootstrapReport) {
        self.print(&json!({
            "hostname": report.hostname,
            "exit_code": report.exit_code(),
            "failed": report.failed_steps(),
            "outcomes": report.outcomes,
        }));
    }

    fn print_error(&self, error: anyhow::Error) {
        self.print(&json!({
            "error": format!("{error:?}"),
        }));
    }
}
