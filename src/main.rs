use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cohort_reports::Result;
use cohort_reports::config::Config;
use cohort_reports::io::downloads::{self, CommandOpener};
use cohort_reports::logging;
use cohort_reports::pipeline::{self, RunContext};
use cohort_reports::publish::LocalPublisher;
use tracing::info;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose, cli.quiet)?;
    match cli.command {
        Command::Build(args) => execute_build(args),
        Command::Collect(args) => execute_collect(args),
    }
}

fn execute_build(args: BuildArgs) -> Result<()> {
    let config = Config::load(&args.course.config)?;
    let ctx = RunContext::new(&config, args.course.course.as_deref())?;
    let mut publisher = LocalPublisher::new(&config.drive_root);
    let reports = pipeline::run(&ctx, &mut publisher)?;
    info!(
        participants = reports.master.len(),
        group_reports = reports.group_reports.len(),
        "reports published"
    );
    Ok(())
}

fn execute_collect(args: CollectArgs) -> Result<()> {
    let config = Config::load(&args.course.config)?;
    let ctx = RunContext::new(&config, args.course.course.as_deref())?;
    let mut opener = CommandOpener::new(args.opener, args.opener_args);
    let filed = pipeline::collect(
        &ctx,
        &args.messages,
        &args.staging,
        &mut opener,
        downloads::POLL_INTERVAL,
    )?;
    info!(downloaded = filed.len(), "exports collected");
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge course exports into per-cohort progress reports."
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the Master Report and publish it with the group reports.
    Build(BuildArgs),
    /// Download the report exports announced by saved notification emails.
    Collect(CollectArgs),
}

#[derive(clap::Args)]
struct CourseArgs {
    /// Configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Course to process; optional when only one course is configured.
    #[arg(long)]
    course: Option<String>,
}

#[derive(clap::Args)]
struct BuildArgs {
    #[command(flatten)]
    course: CourseArgs,
}

#[derive(clap::Args)]
struct CollectArgs {
    #[command(flatten)]
    course: CourseArgs,

    /// Directory of saved export notification messages (`.eml`).
    #[arg(long)]
    messages: PathBuf,

    /// Directory the browser downloads into.
    #[arg(long)]
    staging: PathBuf,

    /// Program used to open each export link.
    #[arg(long)]
    opener: String,

    /// Extra argument passed to the opener before the link.
    #[arg(long = "opener-arg")]
    opener_args: Vec<String>,
}
