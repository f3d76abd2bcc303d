//! Certificate management for the configured SSL strategy.

use crate::config::{SslStrategy, StackConfig, Workspace};
use crate::docker;
use crate::executor::CommandExecutor;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

pub async fn mkcert_available(executor: &dyn CommandExecutor) -> bool {
    matches!(
        executor.run("mkcert", &["-version"], None).await,
        Ok(output) if output.success
    )
}

fn file_name_or(path: &str, fallback: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(fallback)
        .to_string()
}

/// Generate a locally-trusted certificate for all configured hosts using
/// mkcert. Assumes the local CA is already installed.
pub async fn generate_self_signed(
    executor: &dyn CommandExecutor,
    workspace: &Workspace,
    config: &StackConfig,
) -> Result<()> {
    if !mkcert_available(executor).await {
        anyhow::bail!(
            "mkcert is not installed. See https://github.com/FiloSottile/mkcert \
             for installation instructions."
        );
    }

    let certs_dir = workspace.certs_dir();
    std::fs::create_dir_all(&certs_dir)?;

    let cert_file = file_name_or(&config.ssl.cert_path, "opal.crt");
    let key_file = file_name_or(&config.ssl.key_path, "opal.key");

    info!(
        "generating certificate for '{}' with mkcert",
        config.hosts.join(" ")
    );

    // mkcert writes relative to its working directory.
    let mut args = vec![
        "-cert-file",
        cert_file.as_str(),
        "-key-file",
        key_file.as_str(),
    ];
    args.extend(config.hosts.iter().map(String::as_str));

    let output = executor
        .run_streaming("mkcert", &args, Some(&certs_dir))
        .await
        .context("failed to run mkcert")?;
    if !output.success {
        anyhow::bail!("mkcert failed to generate the certificate");
    }

    info!("certificate written to {}", certs_dir.display());
    Ok(())
}

/// Renew the Let's Encrypt certificate through the stack's certbot service.
async fn renew_letsencrypt(
    executor: &dyn CommandExecutor,
    workspace: &Workspace,
    config: &StackConfig,
) -> Result<()> {
    info!("renewing Let's Encrypt certificate via certbot");
    docker::compose(
        executor,
        workspace,
        config,
        &["run", "--rm", "certbot", "renew"],
    )
    .await?;
    Ok(())
}

/// Regenerate or renew certificates according to the configured strategy.
pub async fn regenerate(
    executor: &dyn CommandExecutor,
    workspace: &Workspace,
    config: &StackConfig,
) -> Result<()> {
    match config.ssl.strategy {
        SslStrategy::SelfSigned => {
            generate_self_signed(executor, workspace, config).await?;
            println!("Certificate regenerated. Restart the stack to apply it ('easy-opal restart').");
        }
        SslStrategy::Letsencrypt => {
            renew_letsencrypt(executor, workspace, config).await?;
            println!("Let's Encrypt certificate renewed. The stack picks it up automatically.");
        }
        SslStrategy::Manual => {
            println!(
                "Strategy is 'manual'. Place your certificate at {} and the key at {}.",
                config.ssl.cert_path, config.ssl.key_path
            );
        }
        SslStrategy::None => {
            println!("Strategy is 'none'. TLS is terminated by an external reverse proxy.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cert_file_names_come_from_config_paths() {
        assert_eq!(file_name_or("data/nginx/certs/opal.crt", "x"), "opal.crt");
        assert_eq!(file_name_or("custom/study.pem", "x"), "study.pem");
        assert_eq!(file_name_or("", "opal.key"), "opal.key");
    }
}
