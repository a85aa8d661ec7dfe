use clap::{Parser, Subcommand};

pub mod check;
pub mod config;
pub mod init;
pub mod logging;
pub mod simulate;
pub mod validate;
pub mod version;

#[derive(Parser)]
#[command(name = "service-suspend")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for service suspend gates", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default gate configuration file
    Init {
        /// Path of the config file to create
        #[arg(long)]
        config: String,

        /// Service name to put in the config
        #[arg(long)]
        name: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Load a config file and print the resulting gate settings
    Validate {
        /// Path to config file
        #[arg(long)]
        config: String,
    },

    /// Decide whether an action call would be let through
    CheckAction {
        /// Path to config file
        #[arg(long)]
        config: String,

        /// Action name within the service (e.g. "baz", not "foo.baz")
        #[arg(long)]
        action: String,

        /// Evaluate as if the service were suspended
        #[arg(long)]
        suspended: bool,

        /// Calling node reported in the rejection
        #[arg(long, default_value = "cli")]
        node_id: String,
    },

    /// Decide whether an event would be delivered
    CheckEvent {
        /// Path to config file
        #[arg(long)]
        config: String,

        /// Event name (e.g. "user.created")
        #[arg(long)]
        event: String,

        /// Evaluate as if the service were suspended
        #[arg(long)]
        suspended: bool,

        /// Sending node reported in the rejection
        #[arg(long, default_value = "cli")]
        node_id: String,
    },

    /// Host the configured service in-process and run a sequence of steps
    Simulate {
        /// Path to config file
        #[arg(long)]
        config: String,

        /// Step to run, in order: "call:<action>" or "emit:<event>"
        #[arg(long = "step", required = true)]
        steps: Vec<String>,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Init {
            config,
            name,
            force,
        } => init::execute(config, name, force),
        Commands::Validate { config } => validate::execute(config),
        Commands::CheckAction {
            config,
            action,
            suspended,
            node_id,
        } => check::execute_action(config, action, suspended, node_id),
        Commands::CheckEvent {
            config,
            event,
            suspended,
            node_id,
        } => check::execute_event(config, event, suspended, node_id),
        Commands::Simulate { config, steps } => simulate::execute(config, steps).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_check_action() {
        let cli = Cli::parse_from([
            "service-suspend",
            "check-action",
            "--config",
            "gate.toml",
            "--action",
            "baz",
        ]);

        match cli.command {
            Commands::CheckAction {
                config,
                action,
                suspended,
                node_id,
            } => {
                assert_eq!(config, "gate.toml");
                assert_eq!(action, "baz");
                assert!(!suspended);
                assert_eq!(node_id, "cli"); // default
            }
            _ => panic!("Expected CheckAction command"),
        }
    }

    #[test]
    fn test_cli_parse_check_event_with_all_options() {
        let cli = Cli::parse_from([
            "service-suspend",
            "check-event",
            "--config",
            "gate.toml",
            "--event",
            "user.created",
            "--suspended",
            "--node-id",
            "node-7",
        ]);

        match cli.command {
            Commands::CheckEvent {
                event,
                suspended,
                node_id,
                ..
            } => {
                assert_eq!(event, "user.created");
                assert!(suspended);
                assert_eq!(node_id, "node-7");
            }
            _ => panic!("Expected CheckEvent command"),
        }
    }

    #[test]
    fn test_cli_parse_simulate_keeps_step_order() {
        let cli = Cli::parse_from([
            "service-suspend",
            "simulate",
            "--config",
            "gate.toml",
            "--step",
            "call:suspendService",
            "--step",
            "call:baz",
            "--step",
            "emit:user.created",
        ]);

        match cli.command {
            Commands::Simulate { steps, .. } => {
                assert_eq!(steps, vec!["call:suspendService", "call:baz", "emit:user.created"]);
            }
            _ => panic!("Expected Simulate command"),
        }
    }

    #[test]
    fn test_cli_simulate_requires_step() {
        let result = Cli::try_parse_from(["service-suspend", "simulate", "--config", "gate.toml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from([
            "service-suspend",
            "init",
            "--config",
            "gate.toml",
            "--name",
            "foo",
        ]);

        match cli.command {
            Commands::Init {
                config,
                name,
                force,
            } => {
                assert_eq!(config, "gate.toml");
                assert_eq!(name, "foo");
                assert!(!force);
            }
            _ => panic!("Expected Init command"),
        }
    }
}
