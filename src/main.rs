mod cli;
mod compose;
mod config;
mod docker;
mod executor;
mod logging;
mod nginx;
mod prompt;
mod setup;
mod snapshot;
mod ssl;
mod template;
mod update;

use crate::cli::{Args, CertCommand, Command, ConfigCommand, ProfileCommand, SnapshotCommand};
use crate::config::{load_config, save_config, RockProfile, Workspace};
use crate::executor::{CommandExecutor, DefaultCommandExecutor};
use crate::prompt::Prompter;
use anyhow::{Context, Result};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_logging(args.verbose);

    let workspace = Workspace::new(&args.path);
    let executor = DefaultCommandExecutor;

    match args.command {
        Command::Setup {
            stack_name,
            hosts,
            port,
            password,
        } => {
            setup::run(
                &workspace,
                &executor,
                setup::SetupOptions {
                    stack_name,
                    hosts,
                    port,
                    password,
                },
            )
            .await
        }

        Command::Up => {
            let config = load_config(&workspace)?;
            println!("Starting the Opal stack...");
            docker::up(&executor, &workspace, &config).await
        }

        Command::Down => {
            let config = load_config(&workspace)?;
            println!("Stopping the Opal stack...");
            docker::down(&executor, &workspace, &config).await
        }

        Command::Restart => {
            let config = load_config(&workspace)?;
            println!("Restarting the Opal stack...");
            docker::restart(&executor, &workspace, &config).await
        }

        Command::Reset => {
            let config = load_config(&workspace)?;
            let mut prompter = Prompter::new()?;
            if !prompter.confirm(
                "This will permanently delete all data (mongo database, etc). Continue?",
                false,
            )? {
                println!("Reset aborted.");
                return Ok(());
            }
            println!("Resetting the Opal stack...");
            docker::reset(&executor, &workspace, &config).await
        }

        Command::Status => {
            let config = load_config(&workspace)?;
            docker::status(&executor, &workspace, &config).await
        }

        Command::Profile(command) => handle_profile(&workspace, command),
        Command::Config(command) => handle_config(&workspace, command),
        Command::Cert(command) => handle_cert(&workspace, &executor, command).await,
        Command::Snapshot(command) => handle_snapshot(&workspace, command),
        Command::Update => update::run(&executor, workspace.root()).await,
    }
}

/// Snapshot the current files, save the new config and regenerate the
/// compose file. Shared tail of every config-mutating command. Rejects
/// invalid configs up front; a saved config that fails validation would
/// block every subsequent command.
fn commit_config_change(workspace: &Workspace, config: &config::StackConfig) -> Result<()> {
    config.validate()?;
    snapshot::create(workspace)?;
    save_config(workspace, config)?;
    compose::generate_compose_file(workspace, config)?;
    println!("\nRun 'easy-opal up' to apply the changes.");
    Ok(())
}

fn handle_profile(workspace: &Workspace, command: ProfileCommand) -> Result<()> {
    match command {
        ProfileCommand::Add { name, image, tag } => {
            let mut config = load_config(workspace)?;

            let (name, image, tag) = if let Some(name) = name {
                (
                    name,
                    image.unwrap_or_else(|| "datashield/rock-base".to_string()),
                    tag.unwrap_or_else(|| "latest".to_string()),
                )
            } else {
                let mut prompter = Prompter::new()?;
                let name =
                    prompter.input("Profile service name (e.g., datashield-rock)", None)?;
                let image = match image {
                    Some(image) => image,
                    None => prompter.input("Docker image", Some("datashield/rock-base"))?,
                };
                let tag = match tag {
                    Some(tag) => tag,
                    None => prompter.input("Image tag", Some("latest"))?,
                };
                (name, image, tag)
            };

            if name.is_empty() {
                anyhow::bail!("profile name must not be empty");
            }
            if config.profiles.iter().any(|p| p.name == name) {
                anyhow::bail!("a profile with the name '{name}' already exists");
            }

            config.profiles.push(RockProfile { name: name.clone(), image, tag });
            commit_config_change(workspace, &config)?;
            println!("Profile '{name}' added to configuration.");
            Ok(())
        }

        ProfileCommand::Remove { name } => {
            let mut config = load_config(workspace)?;
            if config.profiles.is_empty() {
                println!("No profiles to remove.");
                return Ok(());
            }

            let index = match name {
                Some(name) => config
                    .profiles
                    .iter()
                    .position(|p| p.name == name)
                    .with_context(|| format!("no profile named '{name}'"))?,
                None => {
                    print_profile_table(&config.profiles, true);
                    let mut prompter = Prompter::new()?;
                    prompter.choose_index(
                        "Enter the index of the profile to remove",
                        config.profiles.len(),
                    )?
                }
            };

            let removed = config.profiles.remove(index);
            commit_config_change(workspace, &config)?;
            println!("Profile '{}' removed.", removed.name);
            Ok(())
        }

        ProfileCommand::List => {
            let config = load_config(workspace)?;
            if config.profiles.is_empty() {
                println!("No profiles configured.");
            } else {
                print_profile_table(&config.profiles, false);
            }
            Ok(())
        }
    }
}

fn print_profile_table(profiles: &[RockProfile], with_index: bool) {
    if with_index {
        println!("{:<6} {:<24} {}", "Index", "Name", "Image");
        for (i, profile) in profiles.iter().enumerate() {
            println!(
                "{:<6} {:<24} {}:{}",
                i, profile.name, profile.image, profile.tag
            );
        }
    } else {
        println!("{:<24} {:<40} {}", "Name", "Docker Image", "Tag");
        for profile in profiles {
            println!("{:<24} {:<40} {}", profile.name, profile.image, profile.tag);
        }
    }
}

fn handle_config(workspace: &Workspace, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = load_config(workspace)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }

        ConfigCommand::ChangePassword { password } => {
            let mut config = load_config(workspace)?;
            let password = match password {
                Some(password) => password,
                None => {
                    let mut prompter = Prompter::new()?;
                    prompter.input("Enter the new Opal administrator password", None)?
                }
            };
            if password.is_empty() {
                anyhow::bail!("password must not be empty");
            }
            config.opal_admin_password = password;
            commit_config_change(workspace, &config)?;
            println!("Password updated in configuration.");
            Ok(())
        }

        ConfigCommand::ChangePort { port } => {
            let mut config = load_config(workspace)?;
            let port = match port {
                Some(port) => port,
                None => {
                    let mut prompter = Prompter::new()?;
                    loop {
                        let answer = prompter.input(
                            "Enter the new external HTTPS port",
                            Some(&config.opal_external_port.to_string()),
                        )?;
                        match answer.parse::<u16>() {
                            Ok(port) if port > 0 => break port,
                            _ => println!("Please enter a valid port number."),
                        }
                    }
                }
            };
            config.opal_external_port = port;
            commit_config_change(workspace, &config)?;
            println!("Port updated in configuration.");
            Ok(())
        }
    }
}

async fn handle_cert(
    workspace: &Workspace,
    executor: &dyn CommandExecutor,
    command: CertCommand,
) -> Result<()> {
    match command {
        CertCommand::Regenerate => {
            let config = load_config(workspace)?;
            println!(
                "Regenerating certificate using '{}' strategy...",
                config.ssl.strategy
            );
            ssl::regenerate(executor, workspace, &config).await
        }
    }
}

fn handle_snapshot(workspace: &Workspace, command: SnapshotCommand) -> Result<()> {
    match command {
        SnapshotCommand::List => {
            let snapshots = snapshot::list(workspace)?;
            if snapshots.is_empty() {
                println!("No snapshots found.");
                return Ok(());
            }
            println!("{:<6} {:<20} {}", "Index", "Date", "Snapshot ID");
            for (i, snap) in snapshots.iter().enumerate() {
                println!(
                    "{:<6} {:<20} {}",
                    i,
                    snap.time.format("%Y-%m-%d %H:%M:%S"),
                    snap.id
                );
            }
            Ok(())
        }

        SnapshotCommand::Restore { id, yes } => {
            let snapshots = snapshot::list(workspace)?;
            if snapshots.is_empty() {
                println!("No snapshots to restore.");
                return Ok(());
            }

            let selected = match id {
                Some(id) => snapshot::find(workspace, &id)?
                    .with_context(|| format!("snapshot '{id}' not found"))?,
                None => {
                    println!("{:<6} {:<20} {}", "Index", "Date", "Snapshot ID");
                    for (i, snap) in snapshots.iter().enumerate() {
                        println!(
                            "{:<6} {:<20} {}",
                            i,
                            snap.time.format("%Y-%m-%d %H:%M:%S"),
                            snap.id
                        );
                    }
                    let mut prompter = Prompter::new()?;
                    let index = prompter
                        .choose_index("Enter the index of the snapshot to restore", snapshots.len())?;
                    snapshots[index].clone()
                }
            };

            println!("\nPreparing to restore from snapshot: {}", selected.id);

            for (name, contents) in snapshot::read_files(&selected)? {
                println!("\nPreview of snapshot's {name}:");
                print!("{contents}");
                if !contents.ends_with('\n') {
                    println!();
                }
            }

            let diffs = snapshot::diff_against_current(workspace, &selected)?;
            if diffs.is_empty() {
                println!("No differences between the current configuration and the snapshot.");
                if !yes {
                    let mut prompter = Prompter::new()?;
                    if !prompter.confirm("Still re-apply this configuration?", false)? {
                        println!("Restore aborted.");
                        return Ok(());
                    }
                }
            } else {
                for (name, diff) in &diffs {
                    println!("\nChanges for {name}:");
                    print!("{diff}");
                }
            }

            let proceed = yes || {
                let mut prompter = Prompter::new()?;
                prompter.confirm(
                    "Overwrite your current configuration with this snapshot?",
                    false,
                )?
            };
            if !proceed {
                println!("Restore aborted.");
                return Ok(());
            }

            snapshot::restore(workspace, &selected)?;
            println!("Configuration successfully restored.");
            println!("Run 'easy-opal restart' for all changes to take effect.");
            Ok(())
        }
    }
}
