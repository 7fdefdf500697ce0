use crate::reports;
use clap::Args;
use replex::config::LadderParams;
use replex::ReResult;

#[derive(Args, Debug, Clone)]
pub struct LadderArgs {
    #[command(flatten)]
    pub ladder: LadderParams,
}

pub fn run(args: &LadderArgs) -> ReResult<()> {
    let temperatures = args.ladder.temperatures()?;
    reports::print_ladder(&temperatures);
    Ok(())
}
