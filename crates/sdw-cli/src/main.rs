use std::path::PathBuf;
use std::process::ExitCode;

use clap::{value_parser, Arg, ArgAction, ArgGroup, Command};

mod commands;
mod logging;

fn target_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("dataset-id")
                .short('d')
                .long("dataset-id")
                .value_parser(value_parser!(u32))
                .help("Dataset ID (e.g. 5 for Dataset005_XXX)"),
        )
        .arg(
            Arg::new("plans-file")
                .long("plans-file")
                .value_parser(value_parser!(PathBuf))
                .help("Plans file to edit directly, skipping dataset lookup"),
        )
        .arg(
            Arg::new("preprocessed-dir")
                .long("preprocessed-dir")
                .value_parser(value_parser!(PathBuf))
                .help("Preprocessed root (defaults to $nnUNet_preprocessed)"),
        )
        .arg(
            Arg::new("plans-name")
                .long("plans-name")
                .default_value(sdw_plans::DEFAULT_PLANS_NAME)
                .help("Plans identifier, i.e. the plans file name without .json"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .group(
            ArgGroup::new("target")
                .args(["dataset-id", "plans-file"])
                .required(true),
        )
}

fn list_arg(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .value_parser(value_parser!(u32))
        .value_delimiter(',')
        .num_args(1..)
        .help(help)
}

fn cli() -> Command {
    Command::new("add-sdw-variants")
        .version(sdw_plans::VERSION)
        .about("Add S/D/W U-Net scaling variants to nnU-Net v2 plans")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(target_args(
            Command::new("add")
                .about("Add the variant grid based on a template configuration")
                .arg(
                    Arg::new("base")
                        .long("base")
                        .help("Template configuration [default: 3d_fullres]"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML settings file; flags override its values"),
                )
                .arg(list_arg("stages", "Resolution stage counts S [default: 4,5,6]"))
                .arg(list_arg("depths", "Convolutions per stage D [default: 2,3]"))
                .arg(list_arg("widths", "Initial widths W [default: 16,32,64]"))
                .arg(
                    Arg::new("max-features")
                        .long("max-features")
                        .value_parser(value_parser!(u32))
                        .help("Channel cap per stage [default: 512]"),
                )
                .arg(
                    Arg::new("stride-policy")
                        .long("stride-policy")
                        .value_parser(["extend", "derive"])
                        .help("Keep template strides (extend) or recompute from patch size (derive)"),
                )
                .arg(
                    Arg::new("overwrite")
                        .long("overwrite")
                        .action(ArgAction::SetTrue)
                        .help("Regenerate variants that already exist"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Report what would change without writing"),
                )
                .arg(
                    Arg::new("no-backup")
                        .long("no-backup")
                        .action(ArgAction::SetTrue)
                        .help("Do not copy the plans file to <file>.bak before writing"),
                ),
        ))
        .subcommand(target_args(
            Command::new("list").about("List S/D/W variants present in a plans file"),
        ))
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("log-json"), matches.get_flag("verbose"));

    let result = match matches.subcommand() {
        Some(("add", args)) => commands::add(args),
        Some(("list", args)) => commands::list(args),
        _ => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
