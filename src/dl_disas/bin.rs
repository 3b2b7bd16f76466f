use droidlift::prelude::DlResult;
use droidlift::{cli, dl_disas};

fn main() -> DlResult<()> {
    let args = cli::disas().get_matches();
    dl_disas::run(&args)
}
