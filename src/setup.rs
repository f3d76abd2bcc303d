//! The setup wizard: collects the stack settings, saves them and generates
//! certificates, nginx config and compose file in one pass.

use crate::config::{self, StackConfig, Workspace};
use crate::executor::CommandExecutor;
use crate::prompt::Prompter;
use crate::{compose, docker, nginx, snapshot, ssl};
use anyhow::{Context, Result};

#[derive(Debug, Default)]
pub struct SetupOptions {
    pub stack_name: Option<String>,
    pub hosts: Vec<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
}

impl SetupOptions {
    /// With no flag given at all, the wizard runs interactively.
    pub fn is_interactive(&self) -> bool {
        self.stack_name.is_none()
            && self.hosts.is_empty()
            && self.port.is_none()
            && self.password.is_none()
    }
}

/// Overlay non-interactive flags onto the defaults.
pub fn apply_options(config: &mut StackConfig, options: &SetupOptions) {
    if let Some(stack_name) = &options.stack_name {
        config.stack_name = stack_name.clone();
    }
    if !options.hosts.is_empty() {
        config.hosts = options.hosts.clone();
    }
    if let Some(port) = options.port {
        config.opal_external_port = port;
    }
    if let Some(password) = &options.password {
        config.opal_admin_password = password.clone();
    }
}

/// Best-effort local IP discovery; the socket is never actually used to
/// send anything.
fn local_ip() -> Option<String> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("10.255.255.255:1").ok()?;
    Some(socket.local_addr().ok()?.ip().to_string())
}

fn gather_interactive(config: &mut StackConfig, prompter: &mut Prompter) -> Result<()> {
    println!("Let's configure your Opal stack.");

    config.stack_name = prompter.input("Enter the stack name", Some(&config.stack_name))?;

    let mut hosts: Vec<String> = Vec::new();
    let mut default_host = Some("localhost");
    loop {
        let host = prompter.input("Enter a hostname or IP address", default_host)?;
        if !host.is_empty() && !hosts.contains(&host) {
            hosts.push(host);
        }

        if let Some(ip) = local_ip() {
            if !hosts.contains(&ip)
                && prompter.confirm(&format!("Also add your local IP '{ip}'?"), true)?
            {
                hosts.push(ip);
            }
        }

        if !prompter.confirm("Add another hostname or IP?", false)? {
            break;
        }
        default_host = None;
    }
    if !hosts.is_empty() {
        config.hosts = hosts;
    }

    loop {
        let answer = prompter.input(
            "Enter the external HTTPS port for Opal",
            Some(&config.opal_external_port.to_string()),
        )?;
        match answer.parse::<u16>() {
            Ok(port) if port > 0 => {
                config.opal_external_port = port;
                break;
            }
            _ => println!("Please enter a valid port number."),
        }
    }

    config.opal_admin_password = prompter.input(
        "Enter the Opal administrator password",
        Some(&config.opal_admin_password),
    )?;

    Ok(())
}

pub async fn run(
    workspace: &Workspace,
    executor: &dyn CommandExecutor,
    options: SetupOptions,
) -> Result<()> {
    let interactive = options.is_interactive();

    if interactive {
        println!("Welcome to the easy-opal setup wizard!");
    }

    if workspace.config_file().exists() && interactive {
        let mut prompter = Prompter::new()?;
        if !prompter.confirm(
            "A configuration file already exists. Overwrite it and start a new setup?",
            false,
        )? {
            println!("Setup aborted.");
            return Ok(());
        }
    }

    if !docker::docker_available(executor).await {
        anyhow::bail!(
            "Docker is not installed or not running. Install and start Docker to continue."
        );
    }
    if !ssl::mkcert_available(executor).await {
        anyhow::bail!(
            "mkcert is not installed; it is required for trusted local certificates. \
             See https://github.com/FiloSottile/mkcert"
        );
    }

    let mut config = StackConfig::default();
    if interactive {
        let mut prompter = Prompter::new()?;
        gather_interactive(&mut config, &mut prompter)?;
    } else {
        println!("Running non-interactive setup...");
        apply_options(&mut config, &options);
    }
    config.validate().context("setup produced an invalid configuration")?;

    // Keep a restorable copy of whatever was there before.
    snapshot::create(workspace)?;

    config::save_config(workspace, &config)?;
    println!("Configuration saved to {}", workspace.config_file().display());

    workspace.ensure_directories()?;
    ssl::regenerate(executor, workspace, &config).await?;
    nginx::generate_nginx_config(workspace, &config)?;
    compose::generate_compose_file(workspace, &config)?;

    println!("\nSetup is complete!");
    println!("Start the Opal stack with: easy-opal up");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_means_interactive() {
        assert!(SetupOptions::default().is_interactive());
        let options = SetupOptions {
            port: Some(8443),
            ..Default::default()
        };
        assert!(!options.is_interactive());
    }

    #[test]
    fn options_overlay_defaults() {
        let mut config = StackConfig::default();
        apply_options(
            &mut config,
            &SetupOptions {
                stack_name: Some("study".to_string()),
                hosts: vec!["opal.example.org".to_string()],
                port: Some(8443),
                password: None,
            },
        );

        assert_eq!(config.stack_name, "study");
        assert_eq!(config.hosts, vec!["opal.example.org"]);
        assert_eq!(config.opal_external_port, 8443);
        // untouched flags keep their defaults
        assert_eq!(config.opal_admin_password, "password");
        assert_eq!(config.profiles.len(), 1);
    }
}
