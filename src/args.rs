//! These structs provide the CLI interface for the kpi CLI.

use crate::sample::{DEFAULT_COUNT, DEFAULT_SEED};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// kpi: A small sales and expenses dashboard.
///
/// Records of sales and expenses are kept in a CSV file in the kpi home directory. Run
/// `kpi serve` and open the printed address in a browser to enter records and see totals,
/// margins, monthly trends and breakdowns by region and product.
///
/// Use `kpi generate` to fill the file with sample data to play with.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the kpi home directory, its config.json and an empty data file.
    ///
    /// This is the first command you should run. Running it again rewrites config.json but leaves
    /// an existing data file alone.
    Init(InitArgs),
    /// Run the dashboard web server.
    Serve(ServeArgs),
    /// Append one record to the data file.
    Add(AddArgs),
    /// Print the dashboard totals.
    Report,
    /// Replace the data file with randomly generated sample records.
    Generate(GenerateArgs),
    /// Type records in one at a time. End the input (Ctrl-D) to finish.
    Interactive,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the kpi data and configuration is held. Defaults to ~/kpi
    #[arg(long, env = "KPI_HOME", default_value_t = default_kpi_home())]
    kpi_home: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn kpi_home(&self) -> &DisplayPath {
        &self.kpi_home
    }
}

/// (Not shown): Args for the `kpi init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The CSV data file, absolute or relative to the kpi home directory.
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// The address the dashboard server listens on, e.g. 127.0.0.1:8050
    #[arg(long)]
    listen: Option<SocketAddr>,
}

impl InitArgs {
    pub fn new(data_file: Option<PathBuf>, listen: Option<SocketAddr>) -> Self {
        Self { data_file, listen }
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    pub fn listen(&self) -> Option<SocketAddr> {
        self.listen
    }
}

/// (Not shown): Args for the `kpi serve` command.
#[derive(Debug, Parser, Clone)]
pub struct ServeArgs {
    /// Listen on this address instead of the one in config.json.
    #[arg(long)]
    listen: Option<SocketAddr>,
}

impl ServeArgs {
    pub fn listen(&self) -> Option<SocketAddr> {
        self.listen
    }
}

/// (Not shown): Args for the `kpi add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The date of the record, YYYY-MM-DD. A trailing time, e.g. 2023-01-05T10:00:00, is dropped.
    #[arg(long)]
    pub date: String,

    /// The sales amount, e.g. 1500 or $1,500.00
    #[arg(long)]
    pub sales: String,

    /// The expenses amount, e.g. 400 or $400.00
    #[arg(long)]
    pub expenses: String,

    /// The region, usually one of North, South, East or West.
    #[arg(long)]
    pub region: String,

    /// The product, usually one of Electronics, Furniture or Apparel.
    #[arg(long)]
    pub product: String,
}

/// (Not shown): Args for the `kpi generate` command.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// The number of records to generate.
    #[arg(long, short = 'n', default_value_t = DEFAULT_COUNT)]
    num: usize,

    /// The random seed. The same seed always produces the same records.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

impl GenerateArgs {
    pub fn new(num: usize, seed: u64) -> Self {
        Self { num, seed }
    }

    pub fn num(&self) -> usize {
        self.num
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

fn default_kpi_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("kpi"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --kpi-home or KPI_HOME instead of relying on the default \
                kpi home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("kpi")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let args = Args::try_parse_from([
            "kpi",
            "--kpi-home",
            "/tmp/kpi",
            "add",
            "--date",
            "2023-01-05",
            "--sales",
            "1000",
            "--expenses",
            "400",
            "--region",
            "North",
            "--product",
            "Electronics",
        ])
        .unwrap();
        assert_eq!(args.common().kpi_home().path(), Path::new("/tmp/kpi"));
        match args.command() {
            Command::Add(add) => {
                assert_eq!(add.date, "2023-01-05");
                assert_eq!(add.product, "Electronics");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_generate_defaults() {
        let args = Args::try_parse_from(["kpi", "--log-level", "debug", "generate"]).unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        match args.command() {
            Command::Generate(g) => {
                assert_eq!(g.num(), DEFAULT_COUNT);
                assert_eq!(g.seed(), DEFAULT_SEED);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_listen() {
        let args = Args::try_parse_from(["kpi", "serve", "--listen", "0.0.0.0:8080"]).unwrap();
        match args.command() {
            Command::Serve(s) => assert_eq!(s.listen().unwrap().port(), 8080),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_add_requires_fields() {
        assert!(Args::try_parse_from(["kpi", "add", "--date", "2023-01-05"]).is_err());
    }
}
