//! Binary to generate/update the expectation files of `tests/fixtures/`
//!
//! Usage:
//!   cargo run --bin accept_expected            # Update all
//!   cargo run --bin accept_expected -- toggle  # Update only fixtures matching "toggle"

use component_translator::translate;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

fn main() {
    let filter: Option<String> = std::env::args().nth(1);
    let fixture_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");

    let mut updated = 0;
    let mut skipped = 0;

    for entry in WalkDir::new(&fixture_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| is_fixture(e.path()))
    {
        let path = entry.path();

        if let Some(ref f) = filter {
            if !path.to_string_lossy().contains(f) {
                skipped += 1;
                continue;
            }
        }

        process_file(path);
        updated += 1;
    }

    println!("Updated {} fixtures, skipped {}", updated, skipped);
}

fn is_fixture(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "js") && !path.to_string_lossy().contains(".expected")
}

fn process_file(path: &Path) {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {:?}: {}", path, e);
            return;
        }
    };

    let is_error_test = path.to_string_lossy().contains("/errors/");
    let expected_load = path.with_extension("expected.load.js");

    match translate(&source) {
        Ok(result) if !is_error_test => {
            write(&path.with_extension("expected.js"), &result.class_body);

            match result.load_handler {
                Some(handler) => write(&expected_load, &format!("{}\n", handler)),
                None if expected_load.exists() => {
                    if let Err(e) = fs::remove_file(&expected_load) {
                        eprintln!("Failed to remove stale {:?}: {}", expected_load, e);
                    } else {
                        println!("  removed {}", expected_load.display());
                    }
                }
                None => {}
            }
        }
        Ok(_) => eprintln!("ERROR: {:?} is in errors/ but translates cleanly", path),
        Err(e) if is_error_test => {
            let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown");
            write(&path.with_extension("expected.err"), &e.render(filename));
        }
        Err(e) => eprintln!("ERROR: {:?} failed to translate but is not in errors/: {}", path, e),
    }
}

fn write(path: &Path, contents: &str) {
    if let Err(e) = fs::write(path, contents) {
        eprintln!("Failed to write {:?}: {}", path, e);
    } else {
        println!("  wrote {}", path.display());
    }
}
