//! CLI argument definitions for the Fieldvox application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fieldvox: fill a farm form by voice, either from one spoken command or a
/// guided question-and-answer interview.
#[derive(Parser, Debug)]
#[command(name = "fieldvox", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the transcription and extraction HTTP server (default).
    Serve,

    /// Extract form fields from one spoken command.
    Extract {
        /// Transcript text. Read from stdin when omitted.
        transcript: Option<String>,
    },

    /// Continuous listening: each stdin line is a final recognizer fragment.
    /// Ends on the stop phrase or end of input.
    Listen,

    /// Guided interview against a transcription server.
    Interview {
        /// Transcription server base URL. Overrides the config file.
        #[arg(long)]
        endpoint: Option<String>,

        /// Directory of pre-recorded answer clips, used in name order.
        /// Silence is recorded when omitted.
        #[arg(long)]
        clips: Option<PathBuf>,
    },
}

impl CliArgs {
    /// The subcommand to run, `serve` if none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > FIELDVOX_CONFIG env var > platform default (~/.fieldvox/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("FIELDVOX_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > FIELDVOX_PORT env var > config file value > 5000.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("FIELDVOX_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        5000
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".fieldvox").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".fieldvox").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let args = CliArgs::try_parse_from(["fieldvox"]).unwrap();
        assert_eq!(args.command(), Command::Serve);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "fieldvox",
            "extract",
            "state is Goa",
            "--log-level",
            "debug",
            "-c",
            "/tmp/fv.toml",
        ])
        .unwrap();
        assert_eq!(
            args.command(),
            Command::Extract {
                transcript: Some("state is Goa".to_string())
            }
        );
        assert_eq!(args.resolve_log_level("info"), "debug");
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/fv.toml"));
    }

    #[test]
    fn test_interview_options() {
        let args = CliArgs::try_parse_from([
            "fieldvox",
            "interview",
            "--endpoint",
            "http://10.0.0.2:5000",
            "--clips",
            "answers",
        ])
        .unwrap();
        match args.command() {
            Command::Interview { endpoint, clips } => {
                assert_eq!(endpoint.as_deref(), Some("http://10.0.0.2:5000"));
                assert_eq!(clips, Some(PathBuf::from("answers")));
            }
            other => panic!("Expected interview, got {:?}", other),
        }
    }

    #[test]
    fn test_port_flag_wins() {
        let args = CliArgs::try_parse_from(["fieldvox", "serve", "--port", "8081"]).unwrap();
        assert_eq!(args.resolve_port(5000), 8081);
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let args = CliArgs::try_parse_from(["fieldvox"]).unwrap();
        assert_eq!(args.resolve_log_level("warn"), "warn");
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(CliArgs::try_parse_from(["fieldvox", "dance"]).is_err());
    }
}
