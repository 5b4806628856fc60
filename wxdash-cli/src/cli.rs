use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use wxdash_core::{
    Config, CurrentClient, CurrentOutcome, GeocodeClient, HistoryClient, HistoryOutcome, convert,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxdash", version, about = "Weather dashboard CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key in the config file.
    Configure,

    /// Show current conditions for a US city.
    Current {
        /// City name, e.g. "boston".
        city: String,
        /// Two-letter state code, e.g. "ma".
        state: String,
    },

    /// Fetch and summarize archived weather for a date range.
    History {
        city: String,
        state: String,

        /// Range start, YYYY-MM-DD.
        #[arg(long)]
        start: String,

        /// Range end, YYYY-MM-DD (inclusive).
        #[arg(long)]
        end: String,

        /// Country code for geocoding.
        #[arg(long, default_value = "US")]
        country: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Current { city, state } => current(&city, &state).await,
            Command::History { city, state, start, end, country } => {
                history(&city, &state, &start, &end, &country).await
            }
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Text::new("OpenWeatherMap API key:")
        .prompt()
        .context("Failed to read API key")?;
    config.api_key = Some(api_key.trim().to_string());

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn current(city: &str, state: &str) -> Result<()> {
    let config = Config::load()?;
    let api_key = config.require_api_key()?.to_string();
    let tz = config.timezone()?;

    let geocoder = GeocodeClient::new(api_key.clone());
    let outcome = CurrentClient::new(api_key)
        .fetch_for_place(&geocoder, city, state, "US")
        .await?;

    let conditions = match outcome {
        CurrentOutcome::Data(conditions) => conditions,
        CurrentOutcome::LocationNotFound => {
            println!("Location not found. Please try again with a different city name.");
            return Ok(());
        }
    };

    let sunrise = local_clock(conditions.sunrise_unix, tz)?;
    let sunset = local_clock(conditions.sunset_unix, tz)?;

    println!(
        "It is currently {} ({})",
        conditions.condition_main.to_lowercase(),
        conditions.condition_desc
    );
    println!(
        "Temperature: {} °F",
        convert::kelvin_to_fahrenheit(conditions.temperature_kelvin)
    );
    println!("Humidity:    {} %", conditions.humidity_percent);
    println!("Sunrise:     {sunrise}");
    println!("Sunset:      {sunset}");
    println!("Icon:        {}", conditions.icon_url());

    Ok(())
}

/// Unix UTC seconds to "hh:mm AM/PM" in the configured timezone.
fn local_clock(ts: i64, tz: chrono_tz::Tz) -> Result<String> {
    let hhmmss = convert::unix_to_local_string(ts, tz, "%H:%M:%S")?;
    convert::format_time_of_day(&hhmmss)
}

async fn history(city: &str, state: &str, start: &str, end: &str, country: &str) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if start > end {
        bail!("Start date {start} is after end date {end}");
    }

    let config = Config::load()?;
    let api_key = config.require_api_key()?.to_string();
    let tz = config.timezone()?;

    let geocoder = GeocodeClient::new(api_key);
    let client = HistoryClient::new(Box::new(geocoder), config.http_cache()?)
        .with_timezone(tz.name());

    let outcome = client.fetch_history(city, state, start, end, country).await?;

    let data = match outcome {
        HistoryOutcome::Data(data) => data,
        HistoryOutcome::LocationNotFound => {
            println!("Location not found. Please try again with a different city name.");
            return Ok(());
        }
    };

    let span = convert::days_between(start, end);
    println!(
        "{span} day(s): {} hourly rows, {} daily rows",
        data.hourly.len(),
        data.daily.len()
    );

    println!("\nDaily summary:");
    for day in &data.daily {
        println!(
            "  {}  mean {:>5.1} °F  precip {:>5.2} in  {}",
            day.timestamp.format("%Y-%m-%d"),
            day.temperature_2m_mean,
            day.precipitation_sum,
            day.weather_desc.as_deref().unwrap_or("-")
        );
    }

    let counts = desc_frequency(&data);
    if !counts.is_empty() {
        println!("\nFrequency of daily weather events:");
        for (desc, count) in counts {
            println!("  {count:>4}  {desc}");
        }
    }

    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Not a valid YYYY-MM-DD date: '{s}'"))
}

/// Count daily rows per description, most frequent first.
fn desc_frequency(data: &wxdash_core::HistoryData) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for day in &data.daily {
        if let Some(desc) = day.weather_desc.as_deref() {
            *counts.entry(desc).or_default() += 1;
        }
    }

    let mut counts: Vec<(String, usize)> =
        counts.into_iter().map(|(d, c)| (d.to_string(), c)).collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}
