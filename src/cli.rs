//! Main `DroidLift` binary command line arguments options.
//!
//! This module declares a function to build `clap` command line arguments
//! parser, so that it can be used from other places than the main binary,
//! such as from bash completion file generator.

use clap::{value_parser, Arg, ArgAction, Command};
use clap_complete::Shell;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Logging switches shared by every tool: `-d` for debug, `-v` for trace
/// and `-e` for ECS formatted output.
fn logging_args() -> [Arg; 3] {
    [
        Arg::new("debug")
            .short('d')
            .long("debug")
            .action(ArgAction::SetTrue)
            .help("Activate debug mode"),
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::SetTrue)
            .help("Activate verbose mode"),
        Arg::new("ecslog")
            .short('e')
            .long("ecslog")
            .action(ArgAction::SetTrue)
            .help("Output logs in ECS format"),
    ]
}

/// Regular expressions restricting the methods a tool works on.
fn filter_args() -> [Arg; 2] {
    [
        Arg::new("filter-class")
            .long("filter-class")
            .value_name("REGEX")
            .action(ArgAction::Set)
            .help("Only consider classes whose internal name matches"),
        Arg::new("filter-method")
            .long("filter-method")
            .value_name("REGEX")
            .action(ArgAction::Set)
            .help("Only consider methods whose name matches"),
    ]
}

fn arg_input() -> Arg {
    Arg::new("input")
        .short('i')
        .long("input")
        .value_name("UNIT")
        .action(ArgAction::Set)
        .required(true)
        .help("Input unit file (JSON)")
}

#[must_use]
pub fn droidlift() -> Command {
    Command::new(NAME)
        .version(VERSION)
        .author(AUTHORS)
        .about(DESCRIPTION)
        .subcommand(lift())
        .subcommand(disas())
        .subcommand(
            Command::new("gen-completions")
                .about("Generates completions file")
                .arg(
                    Arg::new("shell")
                        .short('s')
                        .long("shell")
                        .action(ArgAction::Set)
                        .value_parser(value_parser!(Shell))
                        .required(true)
                        .help("Shell type for completion generation"),
                ),
        )
}

#[must_use]
pub fn lift() -> Command {
    Command::new("lift")
        .bin_name("dl-lift")
        .version(VERSION)
        .author(AUTHORS)
        .about("Lifts method bodies into typed three-address code")
        .args(logging_args())
        .arg(arg_input())
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .action(ArgAction::Set)
                .help("Write the lifted bodies to FILE instead of stdout"),
        )
        .arg(
            Arg::new("cfg")
                .long("cfg")
                .value_name("DIR")
                .action(ArgAction::Set)
                .help("Write the control flow graph of each lifted body as a dot file under DIR"),
        )
        .args(filter_args())
        .arg(
            Arg::new("no-typing")
                .long("no-typing")
                .action(ArgAction::SetTrue)
                .help("Only decode bodies, without inferring the types of locals"),
        )
}

#[must_use]
pub fn disas() -> Command {
    Command::new("disas")
        .bin_name("dl-disas")
        .version(VERSION)
        .author(AUTHORS)
        .about("Disassembles method bodies")
        .args(logging_args())
        .arg(arg_input())
        .args(filter_args())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_consistent() {
        droidlift().debug_assert();
        lift().debug_assert();
        disas().debug_assert();
    }

    #[test]
    fn lift_arguments() {
        let args = lift()
            .try_get_matches_from([
                "dl-lift", "-i", "unit.json", "--no-typing", "-d", "--cfg", "graphs",
            ])
            .unwrap();
        assert_eq!(args.get_one::<String>("input").unwrap(), "unit.json");
        assert!(args.get_flag("no-typing"));
        assert_eq!(args.get_one::<String>("cfg").unwrap(), "graphs");
        assert!(args.get_flag("debug"));
        assert!(!args.get_flag("verbose"));
        assert!(lift().try_get_matches_from(["dl-lift"]).is_err());
    }
}
