use anyhow::Result;
use clap::Parser;
use mkdelegation_cli::{MkDelegationCli, init_tracing, run};

pub fn main() -> Result<()> {
    let cli = MkDelegationCli::parse();
    init_tracing(cli.verbose);

    let output = run(&cli)?;
    println!("{output}");
    Ok(())
}
