use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the folio binary.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Homepage and blog build tool")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render every markdown post (and the timeline, when configured).
    Build(BuildArgs),
    /// Render a timeline data file to an HTML fragment.
    Timeline(TimelineArgs),
    /// Print the normalised frontmatter of a markdown document.
    Frontmatter(FrontmatterArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatesOverride {
    /// Override the IANA timezone used to anchor formatted dates.
    #[arg(long = "dates-timezone", value_name = "TZ")]
    pub timezone: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub dates: DatesOverride,

    /// Override the directory containing markdown posts.
    #[arg(long = "content-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub content_dir: Option<PathBuf>,

    /// Override the directory receiving rendered artifacts.
    #[arg(long = "output-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Override the timeline data file rendered alongside the posts.
    #[arg(long = "timeline", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub timeline_path: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TimelineArgs {
    /// Timeline data file (JSON array of events).
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Write the fragment to this path instead of stdout.
    #[arg(long, short, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FrontmatterArgs {
    #[command(flatten)]
    pub dates: DatesOverride,

    /// Markdown document to inspect.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}
