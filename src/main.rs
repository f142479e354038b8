use cafe_report::{ReportOptions, SavedStateEngine, do_report, read_report};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Reload a saved CAFE report and write it again as `.cafe` text or HTML.
///
/// This binary carries no statistical engine, so the report is always
/// re-serialized from the saved state (as with the `save` flag).
#[derive(Parser, Debug)]
#[command(name = "cafe-report", version, about = "Re-serialize a saved CAFE report")]
struct Args {
    /// Path to a previously written report (.cafe, optionally .gz)
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Report command: output name followed by flags (html, save, ...)
    #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
    report: Vec<String>,

    /// Quiet mode: only warnings and errors are logged
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut options = match ReportOptions::from_tokens(&args.report) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    if !options.just_save {
        if options.branch_cutting || options.likelihood || options.lh2 {
            warn!("statistical flags ignored: no engine is linked into this binary");
        }
        options = ReportOptions {
            branch_cutting: false,
            likelihood: false,
            lh2: false,
            just_save: true,
            ..options
        };
    }

    let t0 = Instant::now();
    let mut run = match read_report(&args.input) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Failed to read {:?}: {e}", args.input);
            std::process::exit(3);
        }
    };
    let read_s = t0.elapsed().as_secs_f64();
    info!("Read {} families over {} nodes in {read_s:.3}s", run.family.len(), run.tree.len());

    let t1 = Instant::now();
    match do_report(&mut run, &mut SavedStateEngine, &options) {
        Ok(path) => {
            let write_s = t1.elapsed().as_secs_f64();
            info!("Writing to {} {write_s:.3}s", path.display());
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(4);
        }
    }
}
