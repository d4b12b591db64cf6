use clap::Parser;
use kpi_dashboard::args::{Args, Command};
use kpi_dashboard::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().kpi_home().path();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args).await?.print(),

        Command::Serve(serve_args) => {
            commands::serve(Config::load(home).await?, serve_args.clone())
                .await?
                .print()
        }

        Command::Add(add_args) => commands::add(Config::load(home).await?, add_args.clone())
            .await?
            .print(),

        Command::Report => commands::report(Config::load(home).await?).await?.print(),

        Command::Generate(generate_args) => {
            commands::generate(Config::load(home).await?, generate_args.clone())
                .await?
                .print()
        }

        Command::Interactive => commands::interactive(Config::load(home).await?)
            .await?
            .print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the given level for the library and the binary only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
