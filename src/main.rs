//! cityweather CLI
//!
//! Current conditions and a daily forecast for a city, with location
//! detection, map hand-off and a shareable summary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cityweather_app::{ApplyOutcome, SessionInbox, WeatherSession};
use cityweather_core::{AppError, Config};
use cityweather_weather::display::{share_text, ConditionsSummary, ForecastRow};
use cityweather_weather::{
    map_url, open_city_in_maps, validate_city_input, CityResolver, ForecastWindow, Geocoder,
    SystemMapLauncher, WeatherProvider, WeatherReport, WeatherSource,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// cityweather CLI
#[derive(Parser)]
#[command(name = "cityweather")]
#[command(author, version, about = "City weather and forecast", long_about = None)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current conditions and the forecast
    ///
    /// Without a city, the device location is used, then the configured
    /// fallback city.
    Show {
        /// City name
        city: Option<String>,

        /// Days to show: 1, 5 or 15
        #[arg(short, long, default_value = "1")]
        window: ForecastWindow,
    },

    /// Detect the current city from device location
    Locate,

    /// Open a city in the system map viewer
    Map {
        /// City name
        city: Option<String>,

        /// Print the map URL instead of opening it
        #[arg(long)]
        print_only: bool,
    },

    /// Print a one-line weather summary for sharing
    Share {
        /// City name
        city: Option<String>,
    },

    /// Interactive session reading commands from stdin
    ///
    /// Commands: 1, 5, 15 (switch window), city NAME, map, share, quit
    Interactive {
        /// Initial city
        city: Option<String>,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = cityweather_core::init(log_filter_from_verbosity(cli.verbose)) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let (config, _validation) = Config::load_validated(cli.config.as_deref())?;

    match cli.command {
        Commands::Show { city, window } => show(&config, city.as_deref(), window).await,
        Commands::Locate => locate(&config).await,
        Commands::Map { city, print_only } => map(&config, city.as_deref(), print_only).await,
        Commands::Share { city } => share(&config, city.as_deref()).await,
        Commands::Interactive { city } => interactive(&config, city.as_deref()).await,
    }
}

/// Print a user-facing error and return the failure code
fn report_error(e: impl Into<AppError>) -> ExitCode {
    let e = e.into();
    tracing::debug!("{:?}", e);
    eprintln!("{}", e.user_message());
    ExitCode::FAILURE
}

/// Typed city, detected city or fallback. `Err` carries the exit code for blank input.
async fn pick_city(config: &Config, explicit: Option<&str>) -> Result<Result<String, ExitCode>> {
    if let Some(input) = explicit {
        return Ok(validate_city_input(input).map_err(report_error));
    }

    let resolver = CityResolver::from_config(config)?;
    let resolved = resolver.resolve(None).await;
    eprintln!("Using {} ({})", resolved.name, resolved.source);
    Ok(Ok(resolved.name))
}

fn render(report: &WeatherReport, window: ForecastWindow) {
    println!("{}", report.city);

    match &report.current {
        Some(current) => {
            let summary = ConditionsSummary::from(current);
            println!(
                "  Now: {}  humidity {}  wind {}  [{}]",
                summary.temperature, summary.humidity, summary.wind, summary.icon
            );
        }
        None => println!("  Current conditions unavailable"),
    }

    println!("  Forecast ({}):", window);
    let days = window.project(&report.days);
    if days.is_empty() {
        println!("    no forecast data");
    }
    for day in days {
        let row = ForecastRow::from(day);
        println!(
            "    {:<24} {:>6}  {:>4}  {:>9}  [{}]",
            row.day, row.temperature, row.humidity, row.wind, row.icon
        );
    }
}

async fn show(config: &Config, city: Option<&str>, window: ForecastWindow) -> Result<ExitCode> {
    let city = match pick_city(config, city).await? {
        Ok(city) => city,
        Err(code) => return Ok(code),
    };

    let provider = WeatherProvider::new(&config.weather)?;
    match provider.fetch(&city).await {
        Ok(report) => {
            render(&report, window);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_error(e)),
    }
}

async fn locate(config: &Config) -> Result<ExitCode> {
    let resolver = CityResolver::from_config(config)?;
    match resolver.detect().await {
        Ok(city) => {
            println!("{}", city);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_error(e)),
    }
}

async fn map(config: &Config, city: Option<&str>, print_only: bool) -> Result<ExitCode> {
    let city = match pick_city(config, city).await? {
        Ok(city) => city,
        Err(code) => return Ok(code),
    };

    let geocoder = Geocoder::new(&config.geocoding)?;

    if print_only {
        return match geocoder.search(&city).await {
            Ok(location) => {
                println!("{}", map_url(&location));
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => Ok(report_error(e)),
        };
    }

    match open_city_in_maps(&geocoder, &SystemMapLauncher, &city).await {
        Ok(url) => {
            println!("{}", url);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_error(e)),
    }
}

async fn share(config: &Config, city: Option<&str>) -> Result<ExitCode> {
    let city = match pick_city(config, city).await? {
        Ok(city) => city,
        Err(code) => return Ok(code),
    };

    let provider = WeatherProvider::new(&config.weather)?;
    let report = match provider.fetch(&city).await {
        Ok(report) => report,
        Err(e) => return Ok(report_error(e)),
    };

    match &report.current {
        Some(current) => {
            let temperature = ConditionsSummary::from(current).temperature;
            println!("{}", share_text(&report.city, &temperature));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No current conditions to share for {}", report.city);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Print the outcome of a settled fetch
fn render_outcome(session: &WeatherSession, outcome: ApplyOutcome) {
    match outcome {
        ApplyOutcome::Updated => {
            if let Some(report) = session.report() {
                render(report, session.window());
            }
        }
        ApplyOutcome::Failed => {
            if let Some(e) = session.last_error() {
                eprintln!("{}", e.user_message());
            }
            if let Some(city) = session.city() {
                eprintln!("Still showing {}", city);
            }
        }
        ApplyOutcome::Stale | ApplyOutcome::Closed => {}
    }
}

async fn interactive(config: &Config, city: Option<&str>) -> Result<ExitCode> {
    let city = match pick_city(config, city).await? {
        Ok(city) => city,
        Err(code) => return Ok(code),
    };

    let provider: Arc<dyn WeatherSource> = Arc::new(WeatherProvider::new(&config.weather)?);
    let geocoder = Geocoder::new(&config.geocoding)?;
    let (mut session, mut inbox) = WeatherSession::new(provider, ForecastWindow::Today)?;

    session.request_fetch(&city)?;
    eprintln!("Loading {}...", city);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_command(&mut session, &mut inbox, &geocoder, line.trim()).await {
                    break;
                }
            }
            Some(msg) = inbox.recv() => {
                let outcome = session.apply(msg);
                render_outcome(&session, outcome);
            }
        }
    }

    // Piped input can end before the first answer arrives
    settle(&mut session, &mut inbox).await;
    session.close();
    Ok(ExitCode::SUCCESS)
}

/// Wait for the latest request, if any, and print what it produced
async fn settle(session: &mut WeatherSession, inbox: &mut SessionInbox) {
    if session.is_loading() {
        if let Some(outcome) = session.settle(inbox).await {
            render_outcome(session, outcome);
        }
    }
}

/// Returns false when the loop should stop
async fn handle_command(
    session: &mut WeatherSession,
    inbox: &mut SessionInbox,
    geocoder: &Geocoder,
    line: &str,
) -> bool {
    let (command, arg) = match line.split_once(' ') {
        Some((command, arg)) => (command, arg),
        None => (line, ""),
    };

    // These read the report, so they act on the answer to the latest request
    if matches!(command, "map" | "share") {
        settle(session, inbox).await;
    }

    match command {
        "" => {}
        "quit" | "exit" | "q" => return false,
        "city" => match session.submit_city(arg) {
            Ok(_) => eprintln!("Loading {}...", arg.trim()),
            Err(e) => eprintln!("{}", AppError::from(e).user_message()),
        },
        "map" => match session.city().map(str::to_string) {
            Some(city) => match open_city_in_maps(geocoder, &SystemMapLauncher, &city).await {
                Ok(url) => println!("{}", url),
                Err(e) => eprintln!("{}", AppError::from(e).user_message()),
            },
            None => eprintln!("No city loaded yet"),
        },
        "share" => match session.share_text() {
            Some(text) => println!("{}", text),
            None => eprintln!("Nothing to share yet"),
        },
        other => match other.parse::<ForecastWindow>() {
            Ok(window) => {
                session.select_window(window);
                match session.report() {
                    Some(report) => render(report, window),
                    None => eprintln!("Window set to {}", window),
                }
            }
            Err(e) => eprintln!("{}", e),
        },
    }
    true
}
