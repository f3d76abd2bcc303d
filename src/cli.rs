use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Set up and manage an OBiBa Opal environment.
#[derive(Parser, Debug)]
#[command(name = "easy-opal", version, about, long_about = None)]
pub struct Args {
    /// Directory holding the stack (config.json, data/, backups/)
    #[arg(long, default_value = ".", global = true)]
    pub path: PathBuf,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Guides you through the initial setup or reconfigures the environment
    Setup {
        /// The name of the Docker stack
        #[arg(long)]
        stack_name: Option<String>,

        /// A hostname or IP for Opal. Can be used multiple times.
        #[arg(long = "host")]
        hosts: Vec<String>,

        /// The external HTTPS port for Opal
        #[arg(long)]
        port: Option<u16>,

        /// The Opal administrator password
        #[arg(long)]
        password: Option<String>,
    },

    /// Starts the Opal stack in detached mode
    Up,

    /// Stops the Opal stack
    Down,

    /// Restarts the Opal stack
    Restart,

    /// Stops the stack and removes all associated data volumes
    Reset,

    /// Displays the status of the containers in the stack
    Status,

    /// Manage Rock server profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Manage easy-opal configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Manage SSL certificates
    #[command(subcommand)]
    Cert(CertCommand),

    /// Manage configuration snapshots
    #[command(subcommand)]
    Snapshot(SnapshotCommand),

    /// Checks for and applies updates from the official git repository
    Update,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Adds a new Rock profile
    Add {
        /// The service name for the profile in docker-compose
        #[arg(long)]
        name: Option<String>,

        /// The Docker image for the profile
        #[arg(long)]
        image: Option<String>,

        /// The tag of the Docker image
        #[arg(long)]
        tag: Option<String>,
    },

    /// Removes an existing Rock profile
    Remove {
        /// Profile name; prompts interactively when omitted
        name: Option<String>,
    },

    /// Lists all configured Rock profiles
    List,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Displays the current configuration
    Show,

    /// Changes the Opal administrator password
    ChangePassword { password: Option<String> },

    /// Changes the external port for Opal
    ChangePort { port: Option<u16> },
}

#[derive(Subcommand, Debug)]
pub enum CertCommand {
    /// Regenerates the SSL certificate based on the configured strategy
    Regenerate,
}

#[derive(Subcommand, Debug)]
pub enum SnapshotCommand {
    /// Lists all available configuration snapshots
    List,

    /// Restores the configuration from a snapshot
    Restore {
        /// Snapshot id (directory name); prompts interactively when omitted
        id: Option<String>,

        /// Bypass confirmation and restore immediately
        #[arg(long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_parse() {
        let args = Args::try_parse_from(["easy-opal", "status"]).expect("parse");
        assert_eq!(args.path, PathBuf::from("."));
        assert_eq!(args.verbose, 0);
        assert!(matches!(args.command, Command::Status));
    }

    #[test]
    fn verbose_flag_counts() {
        let args = Args::try_parse_from(["easy-opal", "up", "-vv"]).expect("parse");
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn setup_accepts_repeated_hosts() {
        let args = Args::try_parse_from([
            "easy-opal",
            "setup",
            "--stack-name",
            "study",
            "--host",
            "opal.example.org",
            "--host",
            "10.0.0.5",
            "--port",
            "8443",
        ])
        .expect("parse");

        match args.command {
            Command::Setup {
                stack_name,
                hosts,
                port,
                password,
            } => {
                assert_eq!(stack_name.as_deref(), Some("study"));
                assert_eq!(hosts, vec!["opal.example.org", "10.0.0.5"]);
                assert_eq!(port, Some(8443));
                assert!(password.is_none());
            }
            other => panic!("expected setup, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_restore_parses_id_and_yes() {
        let args =
            Args::try_parse_from(["easy-opal", "snapshot", "restore", "20260827_120000", "--yes"])
                .expect("parse");
        match args.command {
            Command::Snapshot(SnapshotCommand::Restore { id, yes }) => {
                assert_eq!(id.as_deref(), Some("20260827_120000"));
                assert!(yes);
            }
            other => panic!("expected snapshot restore, got {other:?}"),
        }
    }

    #[test]
    fn profile_add_flags_are_optional() {
        let args = Args::try_parse_from(["easy-opal", "profile", "add"]).expect("parse");
        match args.command {
            Command::Profile(ProfileCommand::Add { name, image, tag }) => {
                assert!(name.is_none());
                assert!(image.is_none());
                assert!(tag.is_none());
            }
            other => panic!("expected profile add, got {other:?}"),
        }
    }
}
