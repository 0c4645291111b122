use featcheck_kernel::{AnalyserConfig, DEFAULT_CONFIG_FILE};
use featcheck_model::DescriptorSet;
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so `--json` output stays parseable. `RUST_LOG`
/// overrides the default `warn` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn load_descriptors_or_exit(path: &str) -> DescriptorSet {
    DescriptorSet::load(Path::new(path)).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    })
}

/// Explicit config path, else `featcheck.toml` in the working directory,
/// else defaults.
pub fn load_config_or_exit(path: Option<&str>) -> AnalyserConfig {
    let path = match path {
        Some(path) => Path::new(path),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
        None => return AnalyserConfig::default(),
    };
    AnalyserConfig::load(path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    })
}

pub fn print_json_or_exit<T: Serialize>(value: &T, what: &str) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("error: failed to render {what} JSON: {e}");
        std::process::exit(2);
    });
    println!("{rendered}");
}
