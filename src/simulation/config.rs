//! Simulation configuration

use serde::{Deserialize, Serialize};

/// Configuration for a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Levels to play, by name (empty = every level in the database)
    pub levels: Vec<String>,
    /// Profiles to pair up, by name (empty = every profile)
    pub profiles: Vec<String>,
    /// Match duration in seconds
    pub duration: f32,
    /// RNG seed for reproducibility (None = random)
    pub seed: Option<u64>,
    /// Simulated frames per second
    pub fps: f32,
    /// Matches per level and profile pairing
    pub runs: u32,
    /// Number of parallel threads (0 = sequential, N = N threads)
    pub parallel: usize,
    /// Output file path (None = stdout)
    pub output_file: Option<String>,
    /// Suppress progress output and logging
    pub quiet: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            levels: Vec::new(),
            profiles: Vec::new(),
            duration: 30.0,
            seed: None,
            fps: 60.0,
            runs: 1,
            parallel: 0,
            output_file: None,
            quiet: false,
        }
    }
}

/// Template simulation settings (checked into git)
pub const SIM_SETTINGS_TEMPLATE: &str = "config/simulation_settings.template.json";
/// Local simulation settings (gitignored, user's custom settings)
pub const SIM_SETTINGS_FILE: &str = "config/simulation_settings.json";

impl SimConfig {
    /// Load configuration from a JSON settings file
    pub fn from_file(path: &str) -> Result<Self, String> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        Self::from_json(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))
    }

    /// Parse configuration from JSON text; missing fields keep their defaults
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Load configuration from default config files
    /// Priority: local settings > template settings > built-in defaults
    pub fn from_config_files() -> Self {
        if let Ok(config) = Self::from_file(SIM_SETTINGS_FILE) {
            return config;
        }
        if let Ok(config) = Self::from_file(SIM_SETTINGS_TEMPLATE) {
            return config;
        }
        Self::default()
    }

    /// Parse configuration from the process command line
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        if args.iter().any(|a| a == "--help" || a == "-h") {
            print_help();
            std::process::exit(0);
        }
        let base = Self::from_config_files();
        base.with_args(&args)
    }

    /// Apply command line arguments on top of this config.
    /// A `--settings` file replaces the base before the other flags apply.
    pub fn with_args(mut self, args: &[String]) -> Self {
        if let Some(i) = args.iter().position(|a| a == "--settings") {
            match args.get(i + 1).map(|path| Self::from_file(path)) {
                Some(Ok(loaded)) => self = loaded,
                Some(Err(e)) => eprintln!("Warning: {}", e),
                None => eprintln!("Warning: --settings needs a file"),
            }
        }

        let mut i = 0;
        while i < args.len() {
            let value = args.get(i + 1);
            match (args[i].as_str(), value) {
                ("--settings", Some(_)) => i += 1,
                ("--level" | "--levels", Some(v)) => {
                    self.levels = split_list(v);
                    i += 1;
                }
                ("--profiles", Some(v)) => {
                    self.profiles = split_list(v);
                    i += 1;
                }
                ("--duration", Some(v)) => {
                    self.duration = v.parse().unwrap_or(self.duration);
                    i += 1;
                }
                ("--seed", Some(v)) => {
                    self.seed = v.parse().ok();
                    i += 1;
                }
                ("--fps", Some(v)) => {
                    self.fps = v.parse().unwrap_or(self.fps);
                    i += 1;
                }
                ("--runs", Some(v)) => {
                    self.runs = v.parse().unwrap_or(self.runs);
                    i += 1;
                }
                ("--parallel", Some(v)) => {
                    self.parallel = v.parse().unwrap_or(0);
                    i += 1;
                }
                ("--output", Some(v)) => {
                    self.output_file = Some(v.clone());
                    i += 1;
                }
                ("--quiet" | "-q", _) => self.quiet = true,
                (other, _) => eprintln!("Warning: ignoring argument {}", other),
            }
            i += 1;
        }

        self
    }
}

/// Comma-separated names, trimmed, empties dropped
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn print_help() {
    println!(
        r#"arenabot - headless duels between ledge-routing AI agents

USAGE:
    cargo run -- [OPTIONS]

OPTIONS:
    --settings <FILE>   Load settings from JSON file (CLI args override file settings)
    --levels <LIST>     Comma-separated level names (default: all levels)
    --profiles <LIST>   Comma-separated profile names to pair up (default: all profiles)
    --duration <SECS>   Match duration in seconds (default: 30)
    --runs <N>          Matches per level and pairing (default: 1)
    --seed <N>          RNG seed for reproducibility
    --fps <N>           Simulated frames per second (default: 60)
    --parallel <N>      Run matches in parallel with N threads
    --output <FILE>     Output JSON to file (default: stdout)
    --quiet, -q         Suppress progress output and logging
    --help, -h          Show this help

EXAMPLES:
    # Every profile pairing on Shelves, three times each
    cargo run -- --levels Shelves --runs 3

    # Reproducible batch on 8 threads
    cargo run -- --seed 42 --parallel 8 --output results.json

SETTINGS FILE FORMAT (JSON):
    {{
      "levels": ["Flat", "Shelves", "Gap"],
      "profiles": ["Rusher", "Keeper"],
      "duration": 30.0,
      "runs": 2
    }}
"#
    );
}
