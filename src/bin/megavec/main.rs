use anyhow::Result;
use clap::Parser;

mod cli;
mod util;
mod cmd_fill;
mod cmd_verify;
mod cmd_sample;
mod cmd_sort;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Fill { common, seed } =>
            cmd_fill::exec(common, seed),

        cli::Cmd::Verify { common, seed } =>
            cmd_verify::exec(common, seed),

        cli::Cmd::Sample { common, seed, draws } =>
            cmd_sample::exec(common, seed, draws),

        cli::Cmd::Sort { common, seed } =>
            cmd_sort::exec(common, seed),
    }
}
