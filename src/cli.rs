use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use skycast_core::{AppError, Config, ConfigError};
use skycast_weather::{Dispatch, ForecastWidget, RunOutcome, WidgetEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::terminal::TerminalRenderer;

/// Suggestions have to arrive within this long after the debounce fires.
const SUGGESTION_WAIT: Duration = Duration::from_secs(15);

#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Current weather and 7-day forecast")]
pub struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast for the configured (or given) position.
    Here {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Show the hourly detail of this day (0 = today).
        #[arg(long)]
        day: Option<usize>,
    },

    /// Forecast for a city name.
    Search {
        city: String,

        #[arg(long)]
        day: Option<usize>,
    },

    /// List matching places for a partial name.
    Suggest { query: String },

    /// Forecast for the n-th suggestion (starting at 1) for a partial name.
    Pick {
        query: String,

        n: usize,

        #[arg(long)]
        day: Option<usize>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = load_config(self.config.as_deref())?;
        let renderer = Arc::new(TerminalRenderer::default());

        match self.command {
            Command::Here { lat, lon, day } => {
                if let (Some(lat), Some(lon)) = (lat, lon) {
                    config.location.latitude = Some(lat);
                    config.location.longitude = Some(lon);
                }
                let widget = build_widget(&config, renderer)?;
                forecast(&widget, WidgetEvent::PageLoaded, day).await
            }
            Command::Search { city, day } => {
                let widget = build_widget(&config, renderer)?;
                forecast(&widget, WidgetEvent::SearchSubmitted(city), day).await
            }
            Command::Suggest { query } => {
                let widget = build_widget(&config, renderer.clone())?;
                suggest(&widget, &renderer, &query).await?;
                Ok(())
            }
            Command::Pick { query, n, day } => {
                if n == 0 {
                    bail!("Suggestions are numbered from 1");
                }
                let widget = build_widget(&config, renderer.clone())?;
                let count = suggest(&widget, &renderer, &query).await?;
                if n > count {
                    bail!("Only {} suggestions for {:?}", count, query);
                }
                forecast(&widget, WidgetEvent::SuggestionChosen(n - 1), day).await
            }
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let loaded = match path {
        Some(path) => Config::load_from(path).and_then(Config::into_validated),
        None => Config::load_validated(),
    };
    let (config, _) = loaded.map_err(config_error)?;
    Ok(config)
}

fn config_error(err: anyhow::Error) -> anyhow::Error {
    match err.downcast::<ConfigError>() {
        Ok(e) => AppError::Config(e).into(),
        Err(other) => other,
    }
}

fn build_widget(config: &Config, renderer: Arc<TerminalRenderer>) -> Result<ForecastWidget> {
    Ok(ForecastWidget::from_config(config, renderer).map_err(AppError::from)?)
}

async fn forecast(widget: &ForecastWidget, event: WidgetEvent, day: Option<usize>) -> Result<()> {
    match widget.dispatch(event).finished().await {
        Some(RunOutcome::Done { .. }) => {}
        Some(RunOutcome::Failed(e)) => return Err(AppError::from(e).into()),
        Some(RunOutcome::Ignored) => bail!("Please enter a city."),
        Some(RunOutcome::Superseded) | None => bail!("Lookup did not complete"),
    }

    if let Some(day) = day.filter(|d| *d > 0) {
        if matches!(widget.dispatch(WidgetEvent::DaySelected(day)), Dispatch::Ignored) {
            bail!("No forecast for day {}", day);
        }
    }
    Ok(())
}

/// Type `query` into the widget and wait for its suggestion list.
async fn suggest(widget: &ForecastWidget, renderer: &TerminalRenderer, query: &str) -> Result<usize> {
    widget.dispatch(WidgetEvent::QueryChanged(query.to_string()));
    if widget.autocomplete().is_pending() {
        tokio::time::timeout(SUGGESTION_WAIT, renderer.suggestions_drawn())
            .await
            .context("Timed out waiting for suggestions")?;
    }

    let count = widget.autocomplete().suggestions().len();
    if count == 0 {
        bail!("No places match {:?}", query);
    }
    Ok(count)
}
