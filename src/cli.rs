//! Command-line interface definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Travelbook - a personal travel journal service
#[derive(Parser)]
#[command(name = "travelbook")]
#[command(version)]
#[command(about = "Track visited cities, regions and countries", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Apply database migrations and exit
    Migrate,

    /// Import countries, regions, cities and collections from a JSON file
    ImportGeo {
        /// Path to the JSON fixture
        file: PathBuf,
    },

    /// Write a sample configuration file ("-" prints to stdout)
    GenerateConfig {
        /// Output path, defaults to config.toml
        path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["travelbook"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_import_geo_with_global_config() {
        let cli =
            Cli::try_parse_from(["travelbook", "import-geo", "geo.json", "--config", "tb.toml"])
                .unwrap();
        assert_eq!(cli.config.as_deref(), Some("tb.toml"));
        assert_eq!(
            cli.command,
            Some(Commands::ImportGeo {
                file: PathBuf::from("geo.json")
            })
        );
    }

    #[test]
    fn test_generate_config_flags() {
        let cli = Cli::try_parse_from(["travelbook", "generate-config", "-", "--force"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::GenerateConfig {
                path: Some("-".to_string()),
                force: true
            })
        );
    }
}
