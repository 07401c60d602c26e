use anyhow::Result;
use clap::Parser;
use dbscript::RunStatus;
use dbscript_cli::{Args, DbscriptCli};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DBSCRIPT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init()
        .ok();

    let args = Args::parse();
    let cli = DbscriptCli::connect(&args)?;

    if let Some(path) = &args.file {
        return Ok(match cli.run_file(path).await? {
            Some(RunStatus::Completed) => ExitCode::SUCCESS,
            _ => ExitCode::FAILURE,
        });
    }

    cli.repl_loop().await?;
    Ok(ExitCode::SUCCESS)
}
