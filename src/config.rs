//! Resolves the CLI's optional paths and flags into the concrete values a run
//! needs, isolating [`crate::main`] from clap's `Option<PathBuf>` plumbing.

use std::path::PathBuf;

use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source_path: PathBuf,
    pub data_path: Option<PathBuf>,
    pub output_path: PathBuf,
    pub devices_path: Option<PathBuf>,
    pub seed: u64,
    pub debug: bool,
}

const DEFAULT_OUTPUT: &str = "musys.out";

impl From<Cli> for RunConfig {
    fn from(cli: Cli) -> Self {
        RunConfig {
            source_path: cli.source,
            data_path: cli.input,
            output_path: cli.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            devices_path: cli.devices,
            seed: cli.seed.unwrap_or(0xA53C_9E17),
            debug: cli.debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_output_falls_back_to_default_name() {
        let cli = Cli {
            source: PathBuf::from("prog.mus"),
            input: None,
            output: None,
            devices: None,
            seed: None,
            debug: false,
        };
        let config: RunConfig = cli.into();
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT));
        assert!(!config.debug);
    }

    #[test]
    fn explicit_seed_is_preserved() {
        let cli = Cli {
            source: PathBuf::from("prog.mus"),
            input: None,
            output: None,
            devices: None,
            seed: Some(42),
            debug: true,
        };
        let config: RunConfig = cli.into();
        assert_eq!(config.seed, 42);
        assert!(config.debug);
    }
}
