//! CLI argument definitions using clap derive macros.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use tack_core::{Classification, QueryOptions};

/// Query Freedom Boat Club reservations from the command line.
///
/// Every query command prints JSON to stdout. `serve` starts a small JSON
/// facade with one route per query.
#[derive(Parser, Debug)]
#[command(name = "tack")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Portal member login
    #[arg(short, long, env = "FBC_USERNAME", global = true)]
    pub username: Option<String>,

    /// Portal member password
    #[arg(short, long, env = "FBC_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Portal origin (overrides the config file)
    #[arg(long, env = "FBC_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Config file (default: $XDG_CONFIG_HOME/tack/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Re-login attempts per request after an auth failure (0-5)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(0..=5))]
    pub max_relogins: Option<u32>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON facade
    Serve {
        /// Listen address (default: 127.0.0.1:4000)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// List club locations
    Locations,
    /// Show one location
    Location {
        /// Location id
        id: String,
    },
    /// List recognized vessel classifications at a location
    Classifications {
        /// Location id
        location_id: String,
    },
    /// List every vessel at a location with its availability
    All {
        /// Location id
        location_id: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Check one vessel's availability
    Available {
        /// Location id
        location_id: String,
        /// Vessel id
        vessel_id: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// List the fleet at a location
    Vessels {
        /// Location id
        location_id: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Show one vessel from the fleet listing
    Vessel {
        /// Location id
        location_id: String,
        /// Vessel id
        vessel_id: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// List the member's own reservations
    Reservations,
}

/// Date scope shared by the date-based commands.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Date to query, YYYY-MM-DD (default: today)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Last date of a range, YYYY-MM-DD
    #[arg(long)]
    pub date_end: Option<NaiveDate>,

    /// Vessel classification (code or name)
    #[arg(short, long)]
    pub classification: Option<Classification>,
}

impl From<QueryArgs> for QueryOptions {
    fn from(args: QueryArgs) -> Self {
        Self {
            date: args.date,
            classification: args.classification,
            date_end: args.date_end,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_locations_parses_successfully() {
        let args = Args::try_parse_from(["tack", "locations"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(matches!(args.command, Command::Locations));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["tack", "-v", "locations"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["tack", "locations", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["tack", "--quiet", "reservations"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["tack", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["tack", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_missing_subcommand_is_error() {
        let err = Args::try_parse_from(["tack"]).unwrap_err();
        assert!(matches!(
            err.kind(),
            clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                | clap::error::ErrorKind::MissingSubcommand
        ));
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["tack", "locations", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    // ==================== Query Tests ====================

    #[test]
    fn test_cli_all_with_dates_and_classification() {
        let args = Args::try_parse_from([
            "tack",
            "all",
            "12",
            "--date",
            "2023-07-08",
            "--date-end",
            "2023-07-09",
            "-c",
            "6",
        ])
        .unwrap();
        let Command::All { location_id, query } = args.command else {
            panic!("expected all command");
        };
        assert_eq!(location_id, "12");
        let opts = QueryOptions::from(query);
        assert_eq!(opts.date, NaiveDate::from_ymd_opt(2023, 7, 8));
        assert_eq!(opts.date_end, NaiveDate::from_ymd_opt(2023, 7, 9));
        assert_eq!(opts.classification, Some(Classification::FishingCruising));
    }

    #[test]
    fn test_cli_invalid_date_rejected() {
        let err = Args::try_parse_from(["tack", "all", "12", "--date", "07/08/2023"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_unknown_classification_rejected() {
        let err = Args::try_parse_from(["tack", "vessels", "12", "-c", "sailing"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_available_requires_vessel_id() {
        let err = Args::try_parse_from(["tack", "available", "12"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    // ==================== Connection Tests ====================

    #[test]
    fn test_cli_credentials_and_base_url() {
        let args = Args::try_parse_from([
            "tack",
            "locations",
            "-u",
            "member@example.com",
            "-p",
            "secret",
            "--base-url",
            "http://127.0.0.1:9",
        ])
        .unwrap();
        assert_eq!(args.username.as_deref(), Some("member@example.com"));
        assert_eq!(args.password.as_deref(), Some("secret"));
        assert_eq!(args.base_url.as_deref(), Some("http://127.0.0.1:9"));
    }

    #[test]
    fn test_cli_max_relogins_range() {
        let args = Args::try_parse_from(["tack", "locations", "--max-relogins", "0"]).unwrap();
        assert_eq!(args.max_relogins, Some(0));

        let err = Args::try_parse_from(["tack", "locations", "--max-relogins", "6"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_serve_bind() {
        let args = Args::try_parse_from(["tack", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        let Command::Serve { bind } = args.command else {
            panic!("expected serve command");
        };
        assert_eq!(bind, Some("0.0.0.0:8080".parse().unwrap()));
    }
}
