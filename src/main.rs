use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use research_loader::app::App;
use research_loader::config::Config;
use research_loader::loader::{Event, Loader, Transition};
use research_loader::logging;
use research_loader::script::{Script, Summary};
use research_loader::ui;

#[derive(Parser)]
#[command(name = "research-loader")]
#[command(about = "Simulated multi-step research loading screen")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Step script file (.toml, .yaml, .json); overrides the config
    #[arg(short, long)]
    script: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration and step script
    Check,

    /// Play the script on a simulated clock and print each transition
    Timeline {
        /// Also print every revealed unit
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    // No subcommand = full-screen loader
    let is_tui_mode = cli.command.is_none();

    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    let script = config.load_script(cli.script.as_deref())?;

    match cli.command {
        Some(Commands::Check) => {
            cmd_check(&config, &script)?;
        }
        Some(Commands::Timeline { verbose }) => {
            cmd_timeline(&config, script, verbose)?;
        }
        None => {
            run_tui(config, script, logging_handle.log_file_path).await?;
        }
    }

    Ok(())
}

async fn run_tui(config: Config, script: Script, log_file_path: Option<PathBuf>) -> Result<()> {
    ui::install_panic_hook();

    let mut app = App::new(config, script)?;
    let result = app.run().await;

    if let Some(log_path) = log_file_path {
        logging::report_log_file(&log_path);
    }

    result
}

fn cmd_check(config: &Config, script: &Script) -> Result<()> {
    let timing = config.timing.to_timing()?;

    println!(
        "Timing: step {}ms, streaming from {}ms, grace {}ms",
        timing.step_duration().as_millis(),
        timing.streaming_start().as_millis(),
        timing.grace().as_millis()
    );
    println!("Script ({} steps)", script.len());
    println!("{}", "─".repeat(60));

    for step in &script.steps {
        let (kind, units) = match &step.summary {
            Summary::Prose(_) => ("words", step.summary.unit_count()),
            Summary::Items(_) => ("items", step.summary.unit_count()),
        };
        let warning = if units == 0 { "  (empty summary)" } else { "" };
        println!(
            "{:>3}  {}  [{} {}]{}",
            step.id, step.in_progress, units, kind, warning
        );
    }

    let total = timing.step_period() * (script.len() as u32 - 1) + timing.step_duration();
    println!();
    println!("Runs for {:.1}s", total.as_secs_f64());

    Ok(())
}

fn cmd_timeline(config: &Config, script: Script, verbose: bool) -> Result<()> {
    let timing = config.timing.to_timing()?;
    let mut loader = Loader::mount(script, timing)?;
    let total = loader.script().len();

    print_transition_header(&loader, total);
    while let Some(deadline) = loader.next_deadline() {
        for transition in loader.advance_to(deadline) {
            if !verbose && matches!(transition.event, Event::RevealTick { .. }) {
                continue;
            }
            print_transition(&loader, &transition, total);
        }
    }

    println!("{:>9}  finished", format_elapsed(loader.now()));
    Ok(())
}

fn print_transition_header(loader: &Loader, total: usize) {
    let title = loader
        .script()
        .get(0)
        .map(|step| step.in_progress.as_str())
        .unwrap_or_default();
    println!(
        "{:>9}  step {}/{}  {:<11}  {}",
        format_elapsed(Duration::ZERO),
        1,
        total,
        "in_progress",
        title
    );
}

fn print_transition(loader: &Loader, transition: &Transition, total: usize) {
    let Some(step) = loader.script().get(transition.step_index) else {
        return;
    };

    let detail = match transition.event {
        Event::RevealTick { units } => format!("{}/{} revealed", transition.revealed_count, units),
        Event::StepDurationElapsed => step.completed.clone(),
        _ => step.in_progress.clone(),
    };

    println!(
        "{:>9}  step {}/{}  {:<11}  {}",
        format_elapsed(transition.at),
        transition.step_index + 1,
        total,
        transition.phase.as_str(),
        detail
    );
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3}s", elapsed.as_secs_f64())
}
