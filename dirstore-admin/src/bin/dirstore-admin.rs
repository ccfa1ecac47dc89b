use clap::Parser;
use dirstore_admin::{init_observability, run, Cli};
use std::io;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_observability(cli.json_logs);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}
