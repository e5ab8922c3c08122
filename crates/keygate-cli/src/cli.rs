use std::path::PathBuf;

use clap::Parser;

/// Keypad gate running against simulated peripherals.
///
/// Type digits on stdin (followed by Enter) to use the keypad; `*` clears
/// the current entry. Ctrl-C stops the gate.
#[derive(Parser, Debug)]
#[command(name = "keygate", version, about)]
pub struct Args {
    /// Configuration file. Defaults to ./keygate.toml when present.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the engine poll interval.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["keygate"]);
        assert!(args.config.is_none());
        assert!(args.poll_interval_ms.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "keygate",
            "--config",
            "gate.toml",
            "--poll-interval-ms",
            "50",
            "-v",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("gate.toml")));
        assert_eq!(args.poll_interval_ms, Some(50));
        assert!(args.verbose);
    }

    #[test]
    fn test_command_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
