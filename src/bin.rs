use clap::ArgMatches;
use clap_complete::{generate, Shell};
use droidlift::prelude::*;
use droidlift::{cli, dl_disas, dl_lift};
use std::io;

fn main() -> DlResult<()> {
    let args = cli::droidlift().get_matches();

    match &args.subcommand() {
        Some(("lift", cmd_args)) => dl_lift::run(cmd_args),
        Some(("disas", cmd_args)) => dl_disas::run(cmd_args),
        Some(("gen-completions", sub_args)) => subcommand_gen_completions(sub_args),
        Some((subcommand, _)) => Err(DlError::BadArguments(format!(
            "unknown subcommand '{subcommand}'"
        ))),
        None => Err(DlError::BadArguments("missing subcommand".to_string())),
    }
}

fn subcommand_gen_completions(sub_args: &ArgMatches) -> DlResult<()> {
    let generator = *sub_args
        .get_one::<Shell>("shell")
        .ok_or_else(|| DlError::BadArguments("--shell needed".to_string()))?;
    let mut cmd = cli::droidlift();
    let cmd_name = cmd.get_name().to_string();
    generate(generator, &mut cmd, cmd_name, &mut io::stdout());
    Ok(())
}
