use std::sync::Arc;

use colored::Colorize;
use ev_ledger::{
    config::ConfigManager,
    core::{aggregation::Outcome, time::SystemClock},
    errors::ValidationError,
    init,
    storage::{JsonFileStore, PersistenceGateway},
    LedgerError, LedgerManager, PeriodScope, Session,
};

const USAGE: &str = "usage: ev_ledger_report [--user NAME] [--month MONTH] [--year YEAR]

Without --month or --year the all-time dashboard is printed. MONTH is 1-12 or
a Bikram Sambat month name; YEAR defaults to the current Bikram Sambat year.";

#[derive(Debug, thiserror::Error)]
enum ReportError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

fn usage(message: String) -> ReportError {
    ReportError::Usage(format!("{message}\n\n{USAGE}"))
}

#[derive(Debug, Default)]
struct Args {
    user: Option<String>,
    month: Option<String>,
    year: Option<i32>,
    help: bool,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, ReportError> {
    let mut args = Args::default();
    while let Some(flag) = raw.next() {
        let mut value = |name: &str| {
            raw.next()
                .ok_or_else(|| usage(format!("{name} needs a value")))
        };
        match flag.as_str() {
            "--user" => args.user = Some(value("--user")?),
            "--month" => args.month = Some(value("--month")?),
            "--year" => {
                let year = value("--year")?;
                let parsed = year
                    .parse()
                    .map_err(|_| usage(format!("invalid year `{year}`")))?;
                args.year = Some(parsed);
            }
            "-h" | "--help" => args.help = true,
            other => return Err(usage(format!("unknown argument `{other}`"))),
        }
    }
    Ok(args)
}

fn parse_month(input: &str, names: &[&str; 12]) -> Result<u8, ReportError> {
    if let Ok(number) = input.parse::<u8>() {
        return match number {
            1..=12 => Ok(number - 1),
            _ => Err(usage(format!("month must be 1-12, got {number}"))),
        };
    }
    names
        .iter()
        .position(|name| name.eq_ignore_ascii_case(input))
        .map(|index| index as u8)
        .ok_or_else(|| usage(format!("unknown month `{input}`")))
}

async fn run() -> Result<(), ReportError> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let config_manager = ConfigManager::new()?;
    let config = config_manager.load()?;
    let store = JsonFileStore::new(config_manager.data_dir())?;
    let gateway = PersistenceGateway::from_config(Arc::new(store), &config);
    let session = args.user.map(Session::signed_in).unwrap_or_default();
    let manager = LedgerManager::open(gateway, session, &config, Arc::new(SystemClock)).await?;

    if let Some(banner) = manager.banner() {
        eprintln!("{}", banner.yellow());
    }

    let outcome = if args.month.is_none() && args.year.is_none() {
        let dashboard = manager.dashboard();
        print!("{}", dashboard.render());
        dashboard.totals.outcome()
    } else {
        let current = manager.default_scope();
        let month = match args.month.as_deref() {
            Some(input) => parse_month(input, &manager.calendar().month_names())?,
            None => current.month(),
        };
        let scope = PeriodScope::new(month, args.year.unwrap_or(current.year()))?;
        let report = manager.monthly_report(scope);
        print!("{}", report.render());
        report.totals.outcome()
    };

    match outcome {
        Outcome::Profit => println!("{}", "In profit".green()),
        Outcome::Loss => println!("{}", "At a loss".red()),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init();

    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
