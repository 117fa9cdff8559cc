//! numdoc CLI
//!
//! Runs the documentation examples of text files and symbol dumps.

use std::path::{Path, PathBuf};

use numdoc::{init_tracing, testfile, testmod_path, Config, ConfigBuilder, Strategy, TestRun};

fn print_usage() {
    eprintln!("Usage: numdoc [options] <file>...");
    eprintln!();
    eprintln!("Files ending in .json are symbol dumps; every documented symbol is tested.");
    eprintln!("Any other file is tested as a single transcript.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -v, -vv             Per-doctest, then per-example output");
    eprintln!("  -x, --fail-fast     Stop a doctest at its first failure");
    eprintln!("  --strategy=<s>      Discovery strategy: all, api (default: all)");
    eprintln!("  --atol=<f>          Absolute tolerance (default: 1e-8)");
    eprintln!("  --rtol=<f>          Relative tolerance (default: 1e-5)");
    eprintln!("  --strict-types      Compare numeric types, not just values");
    eprintln!("  --no-parallel       Run doctests one at a time");
    eprintln!("  --skip=<name>       Skip a fully-qualified name (repeatable)");
    eprintln!("  --report-cascade    Also report errors caused by earlier errors");
}

fn usage_error(message: &str) -> ! {
    eprintln!("error: {message}");
    eprintln!();
    print_usage();
    std::process::exit(2);
}

fn parse_float(arg: &str, value: &str) -> f64 {
    value
        .parse()
        .unwrap_or_else(|_| usage_error(&format!("invalid number in '{arg}'")))
}

fn parse_args(args: &[String]) -> (ConfigBuilder, Vec<PathBuf>) {
    let defaults = Config::default();
    let (mut atol, mut rtol) = (defaults.atol, defaults.rtol);
    let mut verbosity = 0u8;
    let mut builder = Config::builder();
    let mut files = Vec::new();

    for arg in args {
        if arg == "-v" || arg == "--verbose" {
            verbosity = verbosity.saturating_add(1);
        } else if arg == "-vv" {
            verbosity = verbosity.saturating_add(2);
        } else if arg == "-x" || arg == "--fail-fast" {
            builder = builder.stop_on_first_failure(true);
        } else if let Some(value) = arg.strip_prefix("--strategy=") {
            let strategy: Strategy = value
                .parse()
                .unwrap_or_else(|e| usage_error(&format!("{e}")));
            builder = builder.strategy(strategy);
        } else if let Some(value) = arg.strip_prefix("--atol=") {
            atol = parse_float(arg, value);
        } else if let Some(value) = arg.strip_prefix("--rtol=") {
            rtol = parse_float(arg, value);
        } else if arg == "--strict-types" {
            builder = builder.strict_types(true);
        } else if arg == "--no-parallel" {
            builder = builder.parallel(false);
        } else if let Some(name) = arg.strip_prefix("--skip=") {
            builder = builder.skip(name);
        } else if arg == "--report-cascade" {
            builder = builder.report_cascade_errors(true);
        } else if arg == "-h" || arg == "--help" {
            print_usage();
            std::process::exit(0);
        } else if arg.starts_with('-') {
            usage_error(&format!("unknown option '{arg}'"));
        } else {
            files.push(PathBuf::from(arg));
        }
    }

    let builder = builder.tolerances(atol, rtol).verbosity(verbosity);
    (builder, files)
}

fn run_file(path: &Path, config: &Config) -> TestRun {
    let is_dump = path.extension().is_some_and(|ext| ext == "json");
    let outcome = if is_dump {
        testmod_path(path, config)
    } else {
        testfile(path, config)
    };
    outcome.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    })
}

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (builder, files) = parse_args(&args);
    if files.is_empty() {
        usage_error("no input files");
    }
    let config = builder.build().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    });

    let mut total = TestRun::default();
    for path in &files {
        tracing::debug!(path = %path.display(), "testing file");
        total.merge(run_file(path, &config));
    }

    print!("{}", total.render(&config));
    std::process::exit(i32::from(!total.succeeded()));
}
