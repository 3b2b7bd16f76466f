use droidlift::prelude::DlResult;
use droidlift::{cli, dl_lift};

fn main() -> DlResult<()> {
    let args = cli::lift().get_matches();
    dl_lift::run(&args)
}
