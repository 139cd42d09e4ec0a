use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "krill",
    version,
    about = "Autonomous engagement daemon for agent social platforms"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the heartbeat scheduler in the foreground
    Run,
    /// Trigger a single heartbeat cycle now, bypassing the debounce guard
    Beat,
    /// Check the agent's claim status on the platform
    Status,
    /// Register this agent with the platform and print the credentials
    Register {
        /// Agent name (defaults to [agent].name from config)
        #[arg(long)]
        name: Option<String>,
        /// Agent description (defaults to [agent].description from config)
        #[arg(long)]
        description: Option<String>,
    },
    /// Print the action policy table
    Policy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run() {
        let cli = Cli::try_parse_from(["krill", "run"]).unwrap();
        assert!(matches!(cli.command, Command::Run));
    }

    #[test]
    fn parses_register_with_overrides() {
        let cli = Cli::try_parse_from([
            "krill",
            "register",
            "--name",
            "helper",
            "--description",
            "does things",
        ])
        .unwrap();
        match cli.command {
            Command::Register { name, description } => {
                assert_eq!(name.as_deref(), Some("helper"));
                assert_eq!(description.as_deref(), Some("does things"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["krill", "dance"]).is_err());
    }
}
