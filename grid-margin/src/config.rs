use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context};
use eia_client::{
    api::{DEFAULT_BASE_URL, MAX_PAGE_SIZE},
    domain::HourWindow,
};
use serde::Deserialize;

pub const CONFIG_PATH_ENV: &str = "GRID_MARGIN_CONFIG";
pub const API_KEY_ENV: &str = "EIA_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EiaConfig {
    pub base_url: String,
    /// Falls back to the `EIA_API_KEY` environment variable when unset.
    pub api_key: Option<String>,
    pub page_size: usize,
    pub timeout_secs: u64,
    pub respondent: Option<String>,
}

impl Default for EiaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            page_size: MAX_PAGE_SIZE,
            timeout_secs: 60,
            respondent: None,
        }
    }
}

impl EiaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn resolve_api_key(&self) -> anyhow::Result<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
            .with_context(|| format!("no API key: set eia.api_key or the {API_KEY_ENV} environment variable"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
}

impl WindowConfig {
    pub fn hours(&self) -> anyhow::Result<HourWindow> {
        HourWindow::parse(&self.start, &self.end).context("invalid [window]")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Demand at or above this fraction of generation marks a critical hour.
    pub critical_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            critical_threshold: 0.94,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub enabled: bool,
    pub per_month: bool,
    /// Relative to `output.dir`.
    pub dir: PathBuf,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            per_month: false,
            dir: PathBuf::from("monthly_plots"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub events_by_month: bool,
    pub plot: PlotConfig,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            events_by_month: false,
            plot: PlotConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub eia: EiaConfig,
    pub window: WindowConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "grid-margin.toml".to_string());
        let contents = fs::read_to_string(&path).with_context(|| format!("reading config file {path}"))?;
        Self::from_toml_str(&contents).with_context(|| format!("loading config file {path}"))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.eia.page_size) {
            bail!("eia.page_size must be between 1 and {MAX_PAGE_SIZE}, got {}", self.eia.page_size);
        }

        let threshold = self.analysis.critical_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            bail!("analysis.critical_threshold must be a non-negative number, got {threshold}");
        }

        self.window.hours()?;
        Ok(())
    }
}
