use std::{
    io::{self, IsTerminal},
    path::PathBuf,
};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Select, Text, error::CustomUserError, validator::Validation};
use log::debug;
use reporter_core::{
    Config, CsvStore, ReporterError, Units, api_key_from_env, fetch_and_record, format_report,
    format_summary, provider_from_config, validate_city,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-reporter",
    version,
    about = "Look up current weather for a city and keep a CSV log of lookups",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub lookup: LookupArgs,

    /// Log level (error, warn, info, debug, trace). Falls back to RUST_LOG, then "warn".
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the unit system, log path and request timeout.
    Configure,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    /// City to look up. Prompts for one when omitted (unless --summary is given).
    pub city: Option<String>,

    /// Print a summary of all logged lookups (after the lookup, if a city is given).
    #[arg(short, long)]
    pub summary: bool,

    /// CSV log file; overrides the configured path.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Unit system: metric, imperial or standard; overrides the configured one.
    #[arg(short, long, value_parser = parse_units)]
    pub units: Option<Units>,

    /// Also print the raw provider payload.
    #[arg(long)]
    pub show_raw: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Command::Configure) => configure(),
            None => self.lookup.run().await,
        }
    }
}

fn parse_units(value: &str) -> Result<Units, String> {
    Units::try_from(value).map_err(|e| e.to_string())
}

impl LookupArgs {
    /// A summary of an explicitly named log touches no preferences.
    fn needs_config(&self) -> bool {
        !(self.summary && self.city.is_none() && self.csv.is_some())
    }

    async fn run(self) -> anyhow::Result<()> {
        let mut config = if self.needs_config() {
            Config::load()?
        } else {
            debug!("summary of an explicit log, skipping config file");
            Config::default()
        };
        if let Some(units) = self.units {
            config.set_units(units);
        }
        let units = config.units()?;
        let store = CsvStore::new(self.csv.clone().unwrap_or_else(|| config.csv_path()));
        debug!("using weather log at {}", store.path().display());

        let raw_city = match self.city {
            Some(city) => Some(city),
            None if self.summary => None,
            None => Some(prompt_city()?),
        };

        if let Some(raw_city) = raw_city {
            let city = validate_city(&raw_city)?;
            let api_key = api_key_from_env()?;
            let provider = provider_from_config(&config, api_key)?;

            let record = fetch_and_record(provider.as_ref(), &store, &city).await?;
            print!("{}", format_report(&record, units));

            if self.show_raw {
                if let Some(raw) = &record.raw_source {
                    let pretty = serde_json::to_string_pretty(raw)
                        .context("Failed to render provider payload")?;
                    println!("{pretty}");
                }
            }

            if self.summary {
                println!();
            }
        }

        if self.summary {
            let summary = store.summarize()?;
            print!("{}", format_summary(&summary));
        }

        Ok(())
    }
}

/// Ask for a city until a valid one is entered.
fn prompt_city() -> anyhow::Result<String> {
    if !io::stdin().is_terminal() {
        return Err(ReporterError::InvalidInput(
            "no city given (pass one as an argument or use --summary)".to_string(),
        )
        .into());
    }

    let city = Text::new("Enter a city name:")
        .with_validator(|input: &str| {
            Ok::<_, CustomUserError>(match validate_city(input) {
                Ok(_) => Validation::Valid,
                Err(ReporterError::InvalidInput(msg)) => Validation::Invalid(msg.into()),
                Err(other) => Validation::Invalid(other.to_string().into()),
            })
        })
        .prompt()?;

    Ok(city)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let options = Units::all().to_vec();
    let current = config.units().unwrap_or_default();
    let start = options.iter().position(|u| *u == current).unwrap_or(0);
    let units = Select::new("Unit system:", options).with_starting_cursor(start).prompt()?;
    config.set_units(units);

    let default_path = config.csv_path().display().to_string();
    let csv_path = Text::new("CSV log path:").with_default(&default_path).prompt()?;
    config.csv_path = Some(PathBuf::from(csv_path.trim()));

    let timeout = CustomType::<u64>::new("Request timeout in seconds (0 for none):")
        .with_default(config.timeout_secs.unwrap_or(0))
        .with_error_message("Please enter a whole number of seconds")
        .prompt()?;
    config.timeout_secs = (timeout > 0).then_some(timeout);

    let path = config.save()?;
    println!("Saved preferences to {}", path.display());
    Ok(())
}

/// Exit status for a failed run.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<ReporterError>().map_or(1, ReporterError::exit_code)
}
