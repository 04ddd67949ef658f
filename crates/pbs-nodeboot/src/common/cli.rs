use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::manager::package::PackageManager;
use crate::output::outputs::Outputs;

#[derive(clap::ValueEnum, Clone)]
pub enum ColorPolicy {
    /// Use colors if the stdout is detected to be a terminal.
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

// Common CLI options
#[derive(Parser)]
pub struct CommonOpts {
    /// Path to the bootstrap configuration file
    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        global = true,
        env = "PBS_NODEBOOT_CONFIG",
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub config: Option<PathBuf>,

    /// Sets console color policy
    #[arg(
        long,
        default_value_t = ColorPolicy::Auto,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub colors: ColorPolicy,

    /// Sets output formatting
    #[arg(
        long,
        env = "PBS_NODEBOOT_OUTPUT_MODE",
        default_value_t = Outputs::CLI,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub output_mode: Outputs,

    /// Enables more detailed log output
    #[arg(
        long,
        env = "PBS_NODEBOOT_DEBUG",
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub debug: bool,
}

// Root CLI options
#[derive(Parser)]
#[command(
    name = "pbs-nodeboot",
    author,
    about,
    version(crate::NODEBOOT_VERSION),
    disable_help_subcommand(true),
    help_expected(true)
)]
pub struct RootOptions {
    #[clap(flatten)]
    pub common: CommonOpts,

    /// Without a subcommand, the node is bootstrapped with default options
    #[clap(subcommand)]
    pub subcmd: Option<SubCommand>,
}

#[derive(Parser)]
pub enum SubCommand {
    /// Install dependencies and register the node in the PBS server
    Run(RunOpts),
    /// Print the commands that would be executed, without running them
    Plan(PlanOpts),
    /// Generate shell completion script
    GenerateCompletion(GenerateCompletionOpts),
}

#[derive(Parser, Default)]
pub struct RunOpts {
    /// Stop after the first command that fails
    #[arg(long)]
    pub fail_fast: bool,

    /// Do not issue `create node` if the node is already known to the PBS server
    #[arg(long)]
    pub skip_existing: bool,

    #[clap(flatten)]
    pub manager: ManagerOpts,
}

#[derive(Parser, Default)]
pub struct PlanOpts {
    #[clap(flatten)]
    pub manager: ManagerOpts,
}

#[derive(Parser, Default)]
pub struct ManagerOpts {
    /// Package manager used to install dependencies.
    /// Overrides the configuration, detected from the host if not set anywhere.
    #[arg(long, value_enum)]
    pub package_manager: Option<PackageManager>,
}

#[derive(Parser)]
pub struct GenerateCompletionOpts {
    /// Shell flavour for which the completion script should be generated
    #[arg(value_enum)]
    pub shell: Shell,
}
