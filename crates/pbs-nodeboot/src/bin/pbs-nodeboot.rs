use std::io;

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches};
use clap_complete::generate;
use cli_table::ColorChoice;

use pbs_nodeboot::bootstrap::plan::BootstrapPlan;
use pbs_nodeboot::bootstrap::runner::SystemRunner;
use pbs_nodeboot::bootstrap::{ExecuteOptions, execute_plan};
use pbs_nodeboot::common::cli::{
    ColorPolicy, CommonOpts, GenerateCompletionOpts, ManagerOpts, PlanOpts, RootOptions, RunOpts,
    SubCommand,
};
use pbs_nodeboot::common::config::BootstrapConfig;
use pbs_nodeboot::common::setup::setup_logging;
use pbs_nodeboot::manager::PathLookup;
use pbs_nodeboot::manager::package::PackageManager;
use pbs_nodeboot::manager::qmgr::{find_pbs_exec, resolve_qmgr_path};
use pbs_nodeboot::output::cli::CliOutput;
use pbs_nodeboot::output::json::JsonOutput;
use pbs_nodeboot::output::outputs::{Output, Outputs};
use pbs_nodeboot::output::quiet::Quiet;

fn make_printer(common: &CommonOpts) -> Box<dyn Output> {
    let color_policy = match common.colors {
        ColorPolicy::Always => ColorChoice::AlwaysAnsi,
        ColorPolicy::Auto => {
            if io::IsTerminal::is_terminal(&io::stdout()) {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            }
        }
        ColorPolicy::Never => ColorChoice::Never,
    };

    // Make sure that colored also respects the color policy
    match color_policy {
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Always | ColorChoice::AlwaysAnsi => colored::control::set_override(true),
        _ => {}
    }

    match common.output_mode {
        Outputs::CLI => Box::new(CliOutput::new(color_policy)),
        Outputs::JSON => Box::new(JsonOutput),
        Outputs::Quiet => Box::new(Quiet),
    }
}

/// Loads the configuration and turns it into a plan for this host.
fn build_plan(common: &CommonOpts, manager_opts: &ManagerOpts) -> anyhow::Result<BootstrapPlan> {
    let config = BootstrapConfig::resolve(common.config.as_deref())
        .context("Cannot load bootstrap configuration")?;

    let lookup = PathLookup;
    let manager = match manager_opts.package_manager.or(config.package_manager) {
        Some(manager) => Some(manager),
        None if config.packages.is_empty() => None,
        None => match PackageManager::detect(&lookup) {
            Ok(manager) => Some(manager),
            Err(error) => {
                log::warn!("{error}, packages will not be installed");
                None
            }
        },
    };
    let pbs_exec = find_pbs_exec();
    let qmgr = resolve_qmgr_path(config.qmgr.as_deref(), &lookup, pbs_exec.as_deref());
    log::debug!("Using qmgr at {}", qmgr.display());

    Ok(BootstrapPlan::from_config(&config, manager, qmgr))
}

/// Returns the exit code of the last executed command.
fn command_run(common: &CommonOpts, printer: &dyn Output, opts: RunOpts) -> anyhow::Result<i32> {
    let plan = build_plan(common, &opts.manager)?;
    let options = ExecuteOptions {
        fail_fast: opts.fail_fast,
        skip_existing: opts.skip_existing,
    };
    let report = execute_plan(&plan, &mut SystemRunner, &options);
    printer.print_report(&report);
    Ok(report.exit_code())
}

fn command_plan(common: &CommonOpts, printer: &dyn Output, opts: PlanOpts) -> anyhow::Result<i32> {
    let plan = build_plan(common, &opts.manager)?;
    printer.print_plan(&plan);
    Ok(0)
}

fn generate_completion(opts: GenerateCompletionOpts) -> anyhow::Result<i32> {
    let mut app = RootOptions::command();
    generate(opts.shell, &mut app, "pbs-nodeboot", &mut io::stdout());
    Ok(0)
}

fn main() {
    let matches = RootOptions::command().get_matches();
    let top_opts = match RootOptions::from_arg_matches(&matches) {
        Ok(opts) => opts,
        Err(error) => error.exit(),
    };

    setup_logging(top_opts.common.debug);

    let printer = make_printer(&top_opts.common);
    let common = &top_opts.common;

    let result = match top_opts.subcmd {
        None => command_run(common, printer.as_ref(), RunOpts::default()),
        Some(SubCommand::Run(opts)) => command_run(common, printer.as_ref(), opts),
        Some(SubCommand::Plan(opts)) => command_plan(common, printer.as_ref(), opts),
        Some(SubCommand::GenerateCompletion(opts)) => generate_completion(opts),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            printer.print_error(e);
            std::process::exit(1);
        }
    }
}
