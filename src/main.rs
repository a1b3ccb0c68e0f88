use std::{
    io::{self, Write},
    path::Path,
    process,
};

use folio::{
    application::{
        build::build_site,
        dates::{configure_date_formatter, date_formatter},
        document::read_frontmatter,
        error::AppError,
        render::render_service,
        timeline::{load_timeline, render_timeline},
    },
    config::{self, FrontmatterArgs, Settings, TimelineArgs},
    infra::{error::InfraError, output, telemetry},
    presentation::views::render_timeline_html,
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Build(config::BuildArgs::default()));

    telemetry::init(&settings.logging)?;
    configure_date_formatter(settings.dates.timezone)?;

    match command {
        config::Command::Build(_) => run_build(&settings),
        config::Command::Timeline(args) => run_timeline(&args),
        config::Command::Frontmatter(args) => run_frontmatter(&args),
    }
}

fn run_build(settings: &Settings) -> Result<(), AppError> {
    info!(
        target = "folio::build",
        content = %settings.site.content_dir.display(),
        output = %settings.site.output_dir.display(),
        timezone = %date_formatter().timezone(),
        "building site"
    );

    let report = build_site(&settings.site, date_formatter(), render_service().as_ref())?;
    if report.is_success() {
        return Ok(());
    }

    for failure in &report.failures {
        warn!(
            target = "folio::build",
            path = %failure.path.display(),
            "{}",
            failure.message
        );
    }
    Err(AppError::validation(format!(
        "{} of {} inputs failed",
        report.failures.len(),
        report.failures.len() + report.rendered.len() + usize::from(report.timeline.is_some())
    )))
}

fn run_timeline(args: &TimelineArgs) -> Result<(), AppError> {
    let events = load_timeline(&args.file)?;
    let view = render_timeline(&events, false)?;
    let html = render_timeline_html(&view)?;

    match args.output.as_deref() {
        Some(path) => write_output(path, &html),
        None => print_stdout(&html),
    }
}

fn run_frontmatter(args: &FrontmatterArgs) -> Result<(), AppError> {
    let source = output::read_to_string(&args.file)?;
    let frontmatter = read_frontmatter(&source, date_formatter())?;
    let json = serde_json::to_string_pretty(&frontmatter).map_err(InfraError::from)?;
    print_stdout(&json)
}

fn write_output(path: &Path, contents: &str) -> Result<(), AppError> {
    output::write_file(path, contents)?;
    info!(
        target = "folio::timeline",
        path = %path.display(),
        "timeline written"
    );
    Ok(())
}

fn print_stdout(contents: &str) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{contents}").map_err(InfraError::from)?;
    Ok(())
}
