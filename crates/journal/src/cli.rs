//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Ingest the NASA Astronomy Picture of the Day once per day and serve the
/// accumulated journal over HTTP.
#[derive(Parser, Debug)]
#[command(name = "stellar-journal")]
#[command(author, version, about)]
pub(crate) struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "CONFIG_PATH")]
    pub(crate) config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_flag() {
        let args = Args::try_parse_from(["stellar-journal", "--config", "config/local.yaml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config/local.yaml"));

        let args = Args::try_parse_from(["stellar-journal", "-c", "prod.yaml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("prod.yaml"));
    }
}
