use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use log::LevelFilter;
use pyscry::{Analyzer, Config, ProblemKey};

/// Whole-program type inference and cross-reference indexing for Python.
#[derive(Debug, Parser)]
#[command(name = "pyscry", version, about)]
struct Args {
    /// File or directory to analyze.
    root: PathBuf,
    /// Directory for the on-disk AST cache (kept across runs).
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Only report warnings and errors.
    #[arg(long, short)]
    quiet: bool,
    /// Verbose analysis logging and extra diagnostics.
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.debug {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env().filter_level(level).init();

    if !args.root.exists() {
        eprintln!("error: no such path: {}", args.root.display());
        return ExitCode::from(2);
    }

    let mut analyzer = Analyzer::new(Config {
        cache_dir: args.cache_dir,
        quiet: args.quiet,
        debug: args.debug,
    });
    analyzer.analyze(&args.root);
    analyzer.finish();

    if !args.quiet {
        for module in analyzer.loaded_modules() {
            println!("module {} ({})", module.qname, module.file);
        }
        let mut shown = 0usize;
        for binding in analyzer.get_all_bindings() {
            if binding.builtin {
                continue;
            }
            println!(
                "  {:<40} {:<12} {}",
                binding.qname,
                binding.kind.to_string().to_lowercase(),
                analyzer.type_to_string(binding.ty)
            );
            shown += 1;
        }
        println!(
            "{} bindings, {} references",
            shown,
            analyzer.get_references().len()
        );
    }

    let mut problem_count = 0usize;
    for (key, diagnostics) in analyzer.get_problems() {
        for d in diagnostics {
            problem_count += 1;
            match key {
                ProblemKey::File(file) => eprintln!("{file}: {}", d.message),
                ProblemKey::Node(_) => eprintln!("{}:{}..{}: {}", d.file, d.start, d.end, d.message),
            }
        }
    }
    if problem_count > 0 && !args.quiet {
        eprintln!("{problem_count} problems");
    }

    // per-file parse failures are reported above but never fail the run
    ExitCode::SUCCESS
}
