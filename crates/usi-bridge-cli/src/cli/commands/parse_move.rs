use crate::cli::args::ParseMoveArgs;
use crate::exit_codes::SUCCESS;
use usi_bridge_core::parse_move;

pub fn run(args: ParseMoveArgs) -> anyhow::Result<i32> {
    let parsed = parse_move(&args.token)?;
    println!("{}", serde_json::to_string(&parsed)?);
    Ok(SUCCESS)
}
