use crate::bootstrap::BootstrapReport;
use crate::bootstrap::plan::BootstrapPlan;

#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum Outputs {
    CLI,
    JSON,
    Quiet,
}

pub trait Output {
    fn print_plan(&self, plan: &BootstrapPlan);
    fn print_report(&self, report: &BootstrapReport);

    fn print_error(&self, error: anyhow::Error);
}
