//! vidupe - near-duplicate video finder
//!
//! Walks a directory for videos, fingerprints each one by a perceptual hash
//! of a single frame plus its duration and size, and groups files whose
//! fingerprints match. Groups are resolved automatically (keep the first
//! file) or one by one in a terminal UI; the files to remove are staged,
//! can be unstaged one batch at a time, and are deleted only on commit.
//!
//! - [`scanner`]: video discovery and fingerprint extraction
//! - [`duplicates`]: fingerprint buckets and the grouping pass
//! - [`controller`]: background scan thread and its event channel
//! - [`session`]: scan session and the resolution workflow
//! - [`actions`]: staging ledger, deletion and preview

pub mod actions;
pub mod cli;
pub mod config;
pub mod controller;
pub mod duplicates;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod session;
pub mod signal;
pub mod tui;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, ensure, Context, Result};

use crate::cli::{Cli, Commands, OutputFormat, ScanArgs};
use crate::config::{default_config_path, Config};
use crate::controller::{ScanController, ScanEvent};
use crate::output::{JsonOutput, TextOutput};
use crate::progress::{ConsoleProgress, ScanObserver};
use crate::scanner::{FingerprintExtractor, FrameExtractor};
use crate::session::{ResolutionWorkflow, ResolveMode, WorkflowState};
use crate::tui::{run_tui, App, Theme};

/// Run the command described by `cli`.
///
/// # Errors
///
/// Configuration, signal-handler, terminal or scan-thread failures. Per-file
/// problems (unreadable videos, failed deletions) are reported, not returned.
pub fn run_app(cli: Cli) -> Result<()> {
    if cli.no_color {
        yansi::disable();
    }

    let tui = matches!(&cli.command, Commands::Scan(args) if args.output == OutputFormat::Tui);
    // The alternate screen would be torn by diagnostics on stderr.
    logging::init_logging(cli.verbose, cli.quiet || tui);

    let config_path = cli.config.as_deref();
    let mut config = Config::load(config_path).context("Failed to load configuration")?;

    match &cli.command {
        Commands::Config => print_config(&config, config_path),
        Commands::Scan(args) => {
            config.apply_scan_args(args).context("Invalid scan options")?;
            run_scan(&cli, args, &config)
        }
    }
}

fn print_config(config: &Config, explicit: Option<&Path>) -> Result<()> {
    let path = explicit.map(Path::to_path_buf).or_else(default_config_path);
    match path {
        Some(path) => println!("# config file: {}", path.display()),
        None => println!("# config file: <none>"),
    }
    println!("# log level: {}", logging::current_level_name());
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn run_scan(cli: &Cli, args: &ScanArgs, config: &Config) -> Result<()> {
    ensure!(args.path.exists(), "Path does not exist: {}", args.path.display());
    ensure!(args.path.is_dir(), "Path is not a directory: {}", args.path.display());
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", args.path.display()))?;

    let mode = config.resolve_mode(args.output);
    if args.output != OutputFormat::Tui && mode == ResolveMode::Manual {
        bail!("Manual mode needs the interactive output (--output tui); use --mode auto or change `mode` in the config");
    }

    let kill = signal::install_handler().context("Failed to set up Ctrl+C handling")?;
    let extractor: Arc<dyn FingerprintExtractor> = Arc::new(FrameExtractor::new(config.probe_config()));
    log::debug!("Scanning {} with {:?}", root.display(), config);

    if args.output == OutputFormat::Tui {
        let mut app = App::new(&root, mode, extractor)
            .with_kill_switch(kill)
            .with_delete_method(config.delete_method)
            .with_poll_interval(config.poll_interval())
            .with_theme(Theme::from_arg(config.theme))
            .with_accessible(cli.accessible);
        run_tui(&mut app)?;

        let left = app.workflow().staged_count();
        if left > 0 {
            println!("{left} files were marked for deletion but not deleted.");
        }
        return Ok(());
    }


    let progress = Arc::new(ConsoleProgress::new(cli.quiet, cli.accessible));
    let observer: Arc<dyn ScanObserver> = progress.clone();
    let mut workflow = ResolutionWorkflow::new(mode).with_observer(Arc::clone(&observer));
    let mut controller = ScanController::new()
        .with_poll_interval(config.poll_interval())
        .with_follow_symlinks(args.follow_symlinks);

    workflow.start_scan(&root, kill.clone())?;
    controller.start(&root, extractor, kill.clone())?;

    let outcome = controller
        .wait(|event| match event {
            ScanEvent::Log(line) => observer.on_log(line),
            ScanEvent::Progress(update) => {
                observer.on_progress(update);
                workflow.record_progress(update);
            }
            ScanEvent::Finished(_) => {}
        })
        .context("Scan ended without a result")?;
    progress.finish();

    let report = outcome.clone();
    let auto = if workflow.finish_scan(outcome)? == WorkflowState::AutoResolving {
        let auto = workflow.run_auto(|done, total| progress.on_group_resolved(done, total))?;
        progress.finish();
        Some(auto)
    } else {
        None
    };

    let staged = workflow.ledger().staged().to_vec();
    let deleted = if args.commit && !staged.is_empty() {
        Some(workflow.commit(config.delete_method)?)
    } else {
        None
    };

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Json => {
            let mut output = JsonOutput::new(&report, &staged);
            if let Some(auto) = &auto {
                output = output.with_auto_report(auto);
            }
            if let Some(result) = &deleted {
                output = output.with_deleted(result);
            }
            output.write_to(&mut stdout, true)?;
        }
        OutputFormat::Text | OutputFormat::Tui => {
            let mut output = TextOutput::new(&report, &staged);
            if let Some(auto) = &auto {
                output = output.with_auto_report(auto);
            }
            if let Some(result) = &deleted {
                output = output.with_deleted(result);
            }
            output.write_to(&mut stdout)?;
        }
    }
    Ok(())
}
