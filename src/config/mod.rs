//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{path::PathBuf, str::FromStr};

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::util::timezone::DEFAULT_TIMEZONE;

pub use cli::{
    BuildArgs, CliArgs, Command, DatesOverride, FrontmatterArgs, LoggingOverrides, TimelineArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const DEFAULT_CONTENT_DIR: &str = "content/posts";
const DEFAULT_OUTPUT_DIR: &str = "dist";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub dates: DateSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub content_dir: PathBuf,
    pub output_dir: PathBuf,
    pub timeline_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DateSettings {
    pub timezone: Tz,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FOLIO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_cli(cli);
    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    site: RawSiteSettings,
    dates: RawDateSettings,
}

impl RawSettings {
    fn apply_cli(&mut self, cli: &CliArgs) {
        self.apply_logging_overrides(&cli.logging);
        match cli.command.as_ref() {
            Some(Command::Build(args)) => self.apply_build_overrides(args),
            Some(Command::Frontmatter(args)) => self.apply_dates_override(&args.dates),
            Some(Command::Timeline(_)) | None => {}
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_build_overrides(&mut self, overrides: &BuildArgs) {
        if let Some(dir) = overrides.content_dir.as_ref() {
            self.site.content_dir = Some(dir.clone());
        }
        if let Some(dir) = overrides.output_dir.as_ref() {
            self.site.output_dir = Some(dir.clone());
        }
        if let Some(path) = overrides.timeline_path.as_ref() {
            self.site.timeline_path = Some(path.clone());
        }
        self.apply_dates_override(&overrides.dates);
    }

    fn apply_dates_override(&mut self, overrides: &DatesOverride) {
        if let Some(tz) = overrides.timezone.as_ref() {
            self.dates.timezone = Some(tz.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            site,
            dates,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let site = build_site_settings(site)?;
        let dates = build_date_settings(dates)?;

        Ok(Self {
            logging,
            site,
            dates,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let content_dir = site
        .content_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR));
    if content_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "site.content_dir",
            "path must not be empty",
        ));
    }

    let output_dir = site
        .output_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    if output_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid("site.output_dir", "path must not be empty"));
    }

    let timeline_path = match site.timeline_path {
        Some(path) if path.as_os_str().is_empty() => {
            return Err(LoadError::invalid(
                "site.timeline_path",
                "path must not be empty",
            ));
        }
        other => other,
    };

    Ok(SiteSettings {
        content_dir,
        output_dir,
        timeline_path,
    })
}

fn build_date_settings(dates: RawDateSettings) -> Result<DateSettings, LoadError> {
    let timezone = match dates.timezone {
        Some(name) => name
            .trim()
            .parse::<Tz>()
            .map_err(|err| LoadError::invalid("dates.timezone", err.to_string()))?,
        None => DEFAULT_TIMEZONE,
    };

    Ok(DateSettings { timezone })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    content_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    timeline_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDateSettings {
    timezone: Option<String>,
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
