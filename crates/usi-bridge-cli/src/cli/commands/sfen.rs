use crate::cli::args::SfenArgs;
use crate::exit_codes::SUCCESS;

pub fn run(args: SfenArgs) -> anyhow::Result<i32> {
    let position = super::load_position(&args.file)?;
    println!("{}", position.to_usi()?);
    Ok(SUCCESS)
}
