//! sentiscope - sentiment breakdown of YouTube comments
//!
//! A CLI host for the analysis session: it submits a video URL to the
//! comment analysis service and renders the classified comments as
//! summary statistics and a filterable list.
//!
//! Exit codes:
//!   0 - Analysis succeeded
//!   1 - Runtime or input error (config, empty URL, cancelled, etc.)
//!   2 - The analysis service reported a failure

mod analysis;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod report;
mod session;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use client::{AnalysisService, ClientConfig, HttpAnalysisService};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::CategoryFilter;
use report::{Report, ReportMetadata};
use session::{AnalysisSession, SessionState, SessionView};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("sentiscope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("sentiscope failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .sentiscope.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so a report on stdout stays clean.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let service = HttpAnalysisService::new(ClientConfig::from(&config.service))?;

    if let Some(ref text) = args.text {
        return run_prediction(&service, text, &args, &config).await;
    }

    let session = AnalysisSession::new(service);

    if args.interactive {
        run_interactive(&session, &args, &config).await
    } else {
        run_once(&session, &args, &config).await
    }
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Fetching and analyzing comments...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn render(report: &Report, config: &Config) -> Result<String> {
    match config.display.format {
        OutputFormat::Markdown => Ok(report::generate_markdown_report(
            report,
            config.display.bar_width,
        )),
        OutputFormat::Json => report::generate_json_report(report),
    }
}

fn build_report(video_url: &str, config: &Config, view: SessionView) -> Report {
    Report {
        metadata: ReportMetadata {
            video_url: video_url.to_string(),
            service_url: config.service.base_url.clone(),
            generated_at: Utc::now(),
        },
        view,
    }
}

/// Analyze one URL, render the result and exit.
async fn run_once<S: AnalysisService>(
    session: &AnalysisSession<S>,
    args: &Args,
    config: &Config,
) -> Result<i32> {
    let url = args.url.clone().unwrap_or_default();

    let pb = spinner(args.quiet);
    let submit = session.submit(&url);
    tokio::pin!(submit);

    let outcome = tokio::select! {
        outcome = &mut submit => outcome,
        _ = tokio::signal::ctrl_c() => {
            session.cancel().await;
            submit.await
        }
    };
    pb.finish_and_clear();

    let state = match outcome {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ {}", e);
            return Ok(1);
        }
    };

    if config.display.default_filter != CategoryFilter::All {
        session.set_filter(config.display.default_filter).await;
    }

    let report = build_report(&url, config, session.current_view().await);
    let output = render(&report, config)?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("✅ Report saved to: {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(match state {
        SessionState::Succeeded(_) => 0,
        SessionState::Failed(_) => 2,
        SessionState::Idle | SessionState::Loading => {
            eprintln!("Analysis cancelled.");
            1
        }
    })
}

/// Classify a single text through the predict endpoint.
async fn run_prediction(
    service: &HttpAnalysisService,
    text: &str,
    args: &Args,
    config: &Config,
) -> Result<i32> {
    if text.trim().is_empty() {
        eprintln!("❌ Please enter some text");
        return Ok(1);
    }

    let pb = spinner(args.quiet);
    let outcome = service.predict_text(text).await;
    pb.finish_and_clear();

    match outcome {
        Ok(comment) => {
            let output = match config.display.format {
                OutputFormat::Markdown => {
                    report::generate_comment_block(1, &comment, config.display.bar_width)
                }
                OutputFormat::Json => serde_json::to_string_pretty(&comment)?,
            };
            println!("{}", output);
            Ok(0)
        }
        Err(e) => {
            warn!("Prediction failed: {}", e);
            eprintln!("❌ {}", e.user_message());
            Ok(2)
        }
    }
}

/// A line typed in interactive mode.
#[derive(Debug, PartialEq)]
enum Command {
    Submit(String),
    Filter(String),
    Show,
    Cancel,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();

    let Some(rest) = line.strip_prefix(':') else {
        return Command::Submit(line.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let arg = parts.next().unwrap_or("").trim();

    match name {
        "filter" | "f" => Command::Filter(arg.to_string()),
        "show" | "s" => Command::Show,
        "cancel" | "c" => Command::Cancel,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

/// Read URLs and commands from stdin until EOF or `:quit`.
async fn run_interactive<S: AnalysisService>(
    session: &AnalysisSession<S>,
    args: &Args,
    config: &Config,
) -> Result<i32> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_url = String::new();

    print!("{}", report::generate_view(&SessionView::Idle, config.display.bar_width));

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match parse_command(&line) {
            Command::Quit => break,
            Command::Show => show(session, &last_url, config).await?,
            Command::Cancel => {
                if !session.cancel().await {
                    println!("Nothing to cancel.");
                }
            }
            Command::Filter(arg) => match arg.parse::<CategoryFilter>() {
                Ok(filter) if session.set_filter(filter).await => {
                    show(session, &last_url, config).await?
                }
                Ok(_) => println!("No results to filter yet."),
                Err(e) => eprintln!("⚠️  {}", e),
            },
            Command::Unknown(name) => eprintln!("⚠️  Unknown command ':{}'", name),
            Command::Submit(input) => {
                let pb = spinner(args.quiet);
                let outcome = drive_submission(session, &input, &mut lines).await?;
                pb.finish_and_clear();

                match outcome {
                    Some(Ok(_)) => {
                        last_url = input;
                        if config.display.default_filter != CategoryFilter::All {
                            session.set_filter(config.display.default_filter).await;
                        }
                        show(session, &last_url, config).await?;
                    }
                    Some(Err(e)) => eprintln!("❌ {}", e),
                    None => break,
                }
            }
        }
    }

    info!("Leaving interactive mode");
    Ok(0)
}

/// Wait for a submission while still answering Ctrl-C and stdin.
///
/// Returns `None` when the user asked to quit mid-analysis.
async fn drive_submission<S: AnalysisService>(
    session: &AnalysisSession<S>,
    input: &str,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<Option<Result<SessionState, error::SessionError>>> {
    let submit = session.submit(input);
    tokio::pin!(submit);

    let mut stdin_open = true;
    let mut quit = false;

    loop {
        tokio::select! {
            biased;

            outcome = &mut submit => {
                return Ok(if quit { None } else { Some(outcome) });
            }
            _ = tokio::signal::ctrl_c() => {
                session.cancel().await;
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    None => stdin_open = false,
                    Some(line) => match parse_command(&line) {
                        Command::Cancel => {
                            session.cancel().await;
                        }
                        Command::Quit => {
                            quit = true;
                            session.cancel().await;
                        }
                        Command::Submit(other) => {
                            if let Err(e) = session.submit(&other).await {
                                eprintln!("⚠️  {}", e);
                            }
                        }
                        Command::Filter(_) => println!("No results to filter yet."),
                        Command::Show => println!("Analysis in progress..."),
                        Command::Unknown(name) => eprintln!("⚠️  Unknown command ':{}'", name),
                    },
                }
            }
        }
    }
}

async fn show<S: AnalysisService>(
    session: &AnalysisSession<S>,
    video_url: &str,
    config: &Config,
) -> Result<()> {
    debug!(
        "Showing {} session (filter: {})",
        session.state().await.tag(),
        session.filter().await
    );

    let report = build_report(video_url, config, session.current_view().await);
    let output = match config.display.format {
        OutputFormat::Markdown => report::generate_view(&report.view, config.display.bar_width),
        OutputFormat::Json => report::generate_json_report(&report)?,
    };
    println!("{}", output);
    Ok(())
}
