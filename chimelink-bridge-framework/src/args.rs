//! CLI argument parsing for bridges.

use std::path::PathBuf;

use clap::Parser;

/// Common CLI arguments for all bridges.
#[derive(Parser, Debug, Clone)]
#[command(about = "Chimelink display bridge", version)]
pub struct BridgeArgs {
    /// Path to configuration file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Verbose output; shorthand for `--log-level debug`.
    #[arg(short, long)]
    pub verbose: bool,
}

impl BridgeArgs {
    /// Parse CLI arguments with a default config path.
    ///
    /// If no `--config` argument is provided, uses the default.
    pub fn parse_with_default(default_config: &'static str) -> Self {
        let matches = <Self as clap::CommandFactory>::command()
            .mut_arg("config", |arg| arg.default_value(default_config))
            .get_matches();

        <Self as clap::FromArgMatches>::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    /// Log level requested on the command line, if any.
    ///
    /// An explicit `--log-level` wins over `--verbose`.
    pub fn log_level_override(&self) -> Option<String> {
        match (&self.log_level, self.verbose) {
            (Some(level), _) => Some(level.clone()),
            (None, true) => Some("debug".to_string()),
            (None, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_flags() {
        let args = BridgeArgs::try_parse_from(["bridge", "-c", "chime.json5", "-v"]).unwrap();
        assert_eq!(args.config, PathBuf::from("chime.json5"));
        assert!(args.verbose);
        assert_eq!(args.log_level_override(), Some("debug".to_string()));
    }

    #[test]
    fn test_explicit_level_wins_over_verbose() {
        let args = BridgeArgs::try_parse_from([
            "bridge",
            "--config",
            "chime.json5",
            "--log-level",
            "trace",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(args.log_level_override(), Some("trace".to_string()));
    }

    #[test]
    fn test_no_override() {
        let args = BridgeArgs::try_parse_from(["bridge", "-c", "chime.json5"]).unwrap();
        assert_eq!(args.log_level_override(), None);
    }

    #[test]
    fn test_config_required() {
        assert!(BridgeArgs::try_parse_from(["bridge"]).is_err());
    }
}
