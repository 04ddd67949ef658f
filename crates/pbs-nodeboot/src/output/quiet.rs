use crate::bootstrap::BootstrapReport;
use crate::bootstrap::plan::BootstrapPlan;
use crate::output::outputs::Output;

/// Prints nothing except errors, the result is conveyed by the exit code.
#[derive(Default)]
pub struct Quiet;

impl Output for Quiet {
    fn print_plan(&self, _plan: &BootstrapPlan) {}

    fn print_report(&self, _report: &BootstrapReport) {}

    fn print_error(&self, error: anyhow::Error) {
        eprintln!("{error:?}");
    }
}
