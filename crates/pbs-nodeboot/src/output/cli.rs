use cli_table::format::{Justify, Separator};
use cli_table::{Cell, CellStruct, Color, ColorChoice, Style, Table, TableStruct, print_stdout};

use colored::Colorize;

use crate::bootstrap::plan::BootstrapPlan;
use crate::bootstrap::{BootstrapReport, StepStatus};
use crate::common::utils::str::{pluralize, truncate_middle};
use crate::output::outputs::Output;

/// Longest stderr excerpt shown in the report table.
const MAX_DETAIL_LENGTH: usize = 60;

pub struct CliOutput {
    color_policy: ColorChoice,
}

impl CliOutput {
    pub fn new(color_policy: ColorChoice) -> CliOutput {
        CliOutput { color_policy }
    }

    fn print_horizontal_table(&self, rows: Vec<Vec<CellStruct>>, header: Vec<CellStruct>) {
        let table = rows
            .table()
            .separator(
                Separator::builder()
                    .title(Some(Default::default()))
                    .column(Some(Default::default()))
                    .build(),
            )
            .title(header);
        self.print_table(table);
    }

    fn print_table(&self, table: TableStruct) {
        let table = table.color_choice(self.color_policy);
        if let Err(e) = print_stdout(table) {
            log::error!("Cannot print table to stdout: {e:?}");
        }
    }
}

fn status_cell(status: &StepStatus) -> CellStruct {
    match status {
        StepStatus::Succeeded => "OK".cell().foreground_color(Some(Color::Green)),
        StepStatus::Failed { code, .. } => format!("FAILED ({code})")
            .cell()
            .foreground_color(Some(Color::Red)),
        StepStatus::SpawnFailed { .. } => "NOT STARTED"
            .cell()
            .foreground_color(Some(Color::Red)),
        StepStatus::Skipped { .. } => "SKIPPED".cell().foreground_color(Some(Color::Yellow)),
    }
}

fn status_detail(status: &StepStatus) -> String {
    let detail: &str = match status {
        StepStatus::Succeeded => "",
        StepStatus::Failed { stderr, .. } => stderr.lines().next().unwrap_or_default(),
        StepStatus::SpawnFailed { error } => error,
        StepStatus::Skipped { reason } => reason,
    };
    truncate_middle(detail, MAX_DETAIL_LENGTH).into_owned()
}

impl Output for CliOutput {
    fn print_plan(&self, plan: &BootstrapPlan) {
        let rows: Vec<_> = plan
            .steps()
            .iter()
            .enumerate()
            .map(|(index, step)| {
                vec![
                    (index + 1).cell().justify(Justify::Right),
                    step.to_string().cell(),
                    plan.command_line(step).cell(),
                ]
            })
            .collect();

        let header = vec![
            "#".cell().bold(true),
            "Step".cell().bold(true),
            "Command".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);
    }

    fn print_report(&self, report: &BootstrapReport) {
        let rows: Vec<_> = report
            .outcomes
            .iter()
            .map(|outcome| {
                vec![
                    outcome.step.to_string().cell(),
                    status_cell(&outcome.status),
                    humantime::format_duration(std::time::Duration::from_millis(
                        outcome.duration.as_millis() as u64,
                    ))
                    .to_string()
                    .cell(),
                    status_detail(&outcome.status).cell(),
                ]
            })
            .collect();

        let header = vec![
            "Step".cell().bold(true),
            "Status".cell().bold(true),
            "Duration".cell().bold(true),
            "Detail".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);

        let failed = report.failed_steps();
        let summary = format!(
            "Node bootstrap on {} finished: {} {}, {failed} failed, exit code {}",
            report.hostname,
            report.outcomes.len(),
            pluralize("step", report.outcomes.len()),
            report.exit_code()
        );
        if failed == 0 {
            println!("{}", summary.green());
        } else {
            println!("{}", summary.red());
        }
    }

    fn print_error(&self, error: anyhow::Error) {
        eprintln!("{error:?}");
    }
}
