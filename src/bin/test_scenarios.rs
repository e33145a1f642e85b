//! Runs the TOML scenarios under tests/scenarios
//!
//!   test-scenarios [FILTER] [--verbose] [--list]
//!
//! FILTER matches against the path relative to the scenarios directory,
//! e.g. `combat/` or `routing/falling_recovery`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use arenabot::testing::{
    SCENARIOS_DIR, TestDefinition, TestResult, discover_tests, parse_test_file, run_test,
};

#[derive(Default)]
struct Options {
    filter: Option<String>,
    verbose: bool,
    list: bool,
}

impl Options {
    fn parse(args: impl Iterator<Item = String>) -> Self {
        let mut options = Self::default();
        for arg in args {
            match arg.as_str() {
                "--verbose" | "-v" => options.verbose = true,
                "--list" | "-l" => options.list = true,
                other if !other.starts_with('-') => options.filter = Some(arg),
                other => eprintln!("Ignoring unknown option {}", other),
            }
        }
        options
    }
}

#[derive(Default)]
struct Tally {
    passed: usize,
    failed: usize,
    errors: usize,
}

impl Tally {
    fn record(&mut self, result: &TestResult) {
        match result {
            TestResult::Pass { .. } => self.passed += 1,
            TestResult::Fail { .. } => self.failed += 1,
            TestResult::Error { .. } => self.errors += 1,
        }
    }

    fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// "combat/holds_stand_off" for tests/scenarios/combat/holds_stand_off.toml
fn scenario_id(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/")
}

fn category(id: &str) -> &str {
    id.rsplit_once('/').map_or("", |(dir, _)| dir)
}

fn report(id: &str, def: Option<&TestDefinition>, result: &TestResult, verbose: bool) {
    let name = id.rsplit('/').next().unwrap_or(id);
    let status = match result {
        TestResult::Pass { frames } => format!("ok ({} frames)", frames),
        TestResult::Fail { .. } => "FAILED".to_string(),
        TestResult::Error { .. } => "ERROR".to_string(),
    };
    println!("  {:<36} {}", name, status);

    match result {
        TestResult::Pass { .. } => {}
        TestResult::Fail { error } if verbose => {
            if let Some(description) = def.and_then(|d| d.description.as_deref()) {
                println!("      {}", description);
            }
            println!("      {}", error.to_string().replace('\n', "\n  "));
        }
        TestResult::Fail { error } => println!("      {}", error.message),
        TestResult::Error { message } => println!("      {}", message),
    }
}

fn list(base: &Path, paths: &[PathBuf]) {
    for path in paths {
        let id = scenario_id(base, path);
        match parse_test_file(path) {
            Ok(def) => println!(
                "{:<40} {}",
                id,
                def.description.as_deref().unwrap_or(&def.name)
            ),
            Err(e) => println!("{:<40} (unreadable: {})", id, e),
        }
    }
}

fn main() -> ExitCode {
    let options = Options::parse(std::env::args().skip(1));
    let base = Path::new(SCENARIOS_DIR);
    if !base.is_dir() {
        eprintln!("No scenarios directory at {}", SCENARIOS_DIR);
        return ExitCode::FAILURE;
    }

    let paths = discover_tests(base, options.filter.as_deref());
    if paths.is_empty() {
        eprintln!(
            "No scenarios found{}",
            options
                .filter
                .as_deref()
                .map(|f| format!(" matching '{}'", f))
                .unwrap_or_default()
        );
        return ExitCode::FAILURE;
    }

    if options.list {
        list(base, &paths);
        return ExitCode::SUCCESS;
    }

    let mut tally = Tally::default();
    let mut current_category = None;
    for path in &paths {
        let id = scenario_id(base, path);
        let dir = category(&id).to_string();
        if current_category.as_ref() != Some(&dir) {
            println!("{}/", if dir.is_empty() { "." } else { &dir });
            current_category = Some(dir);
        }

        let (def, result) = match parse_test_file(path) {
            Ok(def) => {
                let result = run_test(&def);
                (Some(def), result)
            }
            Err(message) => (None, TestResult::Error { message }),
        };
        tally.record(&result);
        report(&id, def.as_ref(), &result, options.verbose);
    }

    println!(
        "\n{} passed, {} failed, {} errors",
        tally.passed, tally.failed, tally.errors
    );
    if tally.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
