use clap::{Parser, Subcommand};
use component_translator::{
    ComponentRequest, ComponentStore, LoaderConfig, TranslateError, TranslationResult, Translator,
    logging,
};
use serde::Serialize;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "componentc")]
#[command(about = "Translate component scripts to custom element class bodies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a single component script
    Translate {
        /// Path to a component script
        #[arg(required_unless_present = "stdin")]
        file: Option<PathBuf>,

        /// Read from stdin
        #[arg(long)]
        stdin: bool,

        /// Output the translation result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Translate every component script (`_*.js`) under a directory
    Check {
        dir: PathBuf,
    },
    /// Load components and print the payload served to the client
    Bundle {
        /// Component names to resolve
        #[arg(required = true)]
        names: Vec<String>,

        /// Components directory (overrides the config file)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// JSON config file with a `components` section
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init() {
        eprintln!("Warning: failed to initialize logging: {}", err);
    }

    let ok = match cli.command {
        Commands::Translate { file, stdin, json } => translate_command(file.as_deref(), stdin, json),
        Commands::Check { dir } => check_command(&dir),
        Commands::Bundle { names, dir, config } => bundle_command(names, dir, config.as_deref()),
    };

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn translate_command(file: Option<&Path>, stdin: bool, json: bool) -> bool {
    let (source, filename) = if stdin {
        let mut source = String::new();
        if let Err(err) = io::stdin().read_to_string(&mut source) {
            eprintln!("Error: failed to read stdin: {}", err);
            return false;
        }
        (source, "<stdin>".to_string())
    } else if let Some(path) = file {
        match fs::read_to_string(path) {
            Ok(source) => (source, display_name(path)),
            Err(err) => {
                eprintln!("Error: failed to read {}: {}", path.display(), err);
                return false;
            }
        }
    } else {
        eprintln!("Error: provide a file or use --stdin");
        return false;
    };

    let result = match component_translator::translate(&source) {
        Ok(result) => result,
        Err(err) => {
            eprint!("{}", render_error(&err, &filename));
            return false;
        }
    };

    if json {
        return print_json(&result);
    }
    print_translation(&result);
    true
}

fn print_translation(result: &TranslationResult) {
    print!("{}", result.class_body);
    if let Some(handler) = &result.load_handler {
        if !result.class_body.ends_with('\n') {
            println!();
        }
        println!("// load handler");
        println!("{}", handler);
    }
}

fn check_command(dir: &Path) -> bool {
    if !dir.is_dir() {
        eprintln!("Error: {} is not a directory", dir.display());
        return false;
    }

    let start = Instant::now();
    let translator = Translator::default();
    let mut checked = 0;
    let mut failed = 0;

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_component_script(e.path()))
    {
        let path = entry.path();
        checked += 1;

        let outcome = fs::read_to_string(path)
            .map_err(|err| format!("failed to read: {}\n", err))
            .and_then(|source| {
                translator
                    .translate(&source)
                    .map_err(|err| render_error(&err, &display_name(path)))
            });

        match outcome {
            Ok(result) => {
                debug!(file = %path.display(), listeners = result.observed_attributes.len(), "translated");
                print_status(true, &path.display().to_string());
            }
            Err(report) => {
                failed += 1;
                print_status(false, &path.display().to_string());
                eprint!("{}", report);
            }
        }
    }

    if checked == 0 {
        eprintln!("No component scripts found in {}", dir.display());
        return false;
    }

    print_summary(checked, failed, start.elapsed());
    failed == 0
}

fn bundle_command(names: Vec<String>, dir: Option<PathBuf>, config: Option<&Path>) -> bool {
    let mut loader_config = match (config, &dir) {
        (Some(path), _) => match LoaderConfig::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                eprint!("{}", err.render(io::stderr().is_terminal()));
                return false;
            }
        },
        (None, Some(dir)) => LoaderConfig::new(dir),
        (None, None) => {
            eprintln!("Error: provide --dir or --config");
            return false;
        }
    };
    if let Some(dir) = dir {
        loader_config.components_dir_path = dir;
    }

    let store = match ComponentStore::new(loader_config) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("Error: invalid translation table: {}", err);
            return false;
        }
    };

    match store.resolve(&ComponentRequest::new(names)) {
        Some(components) => print_json(&components),
        None => print_json(&serde_json::Value::Null),
    }
}

fn print_json<T: Serialize>(value: &T) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(err) => {
            eprintln!("Error: failed to serialize output: {}", err);
            false
        }
    }
}

/// `_card.js` and friends. Other scripts in a component directory are not translated.
fn is_component_script(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('_') && name.ends_with(".js"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn render_error(err: &TranslateError, filename: &str) -> String {
    if io::stderr().is_terminal() {
        err.render_color(filename)
    } else {
        err.render(filename)
    }
}

fn print_status(ok: bool, path: &str) {
    let is_tty = io::stderr().is_terminal();
    match (ok, is_tty) {
        (true, true) => eprintln!("  \x1b[32m✓\x1b[0m {}", path),
        (true, false) => eprintln!("  ✓ {}", path),
        (false, true) => eprintln!("  \x1b[31m✗\x1b[0m {}", path),
        (false, false) => eprintln!("  ✗ {}", path),
    }
}

fn print_summary(count: usize, failed: usize, elapsed: std::time::Duration) {
    let is_tty = io::stderr().is_terminal();
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };
    let failures = if failed == 0 {
        String::new()
    } else {
        format!(", {} failed", failed)
    };

    if is_tty {
        eprintln!("\n\x1b[1m✨ Checked {} {}{} in {}\x1b[0m", count, files_word, failures, time_str);
    } else {
        eprintln!("\n✨ Checked {} {}{} in {}", count, files_word, failures, time_str);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
