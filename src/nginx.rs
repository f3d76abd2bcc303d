//! Renders the nginx reverse-proxy configuration and installs the static
//! maintenance page next to it.

use crate::config::{SslStrategy, StackConfig, Workspace};
use crate::template;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Generate `data/nginx/conf/nginx.conf` for the configured SSL strategy
/// and copy the maintenance page into `data/nginx/html/`.
///
/// With strategy `none` an external reverse proxy terminates TLS, so no
/// configuration is written and any stale file from a previous strategy is
/// removed.
pub fn generate_nginx_config(workspace: &Workspace, config: &StackConfig) -> Result<()> {
    if config.ssl.strategy == SslStrategy::None {
        info!("skipping NGINX configuration (reverse-proxy mode)");
        let output_path = workspace.nginx_conf_file();
        if output_path.exists() {
            std::fs::remove_file(&output_path)
                .with_context(|| format!("failed to remove stale {}", output_path.display()))?;
            debug!("removed stale {}", output_path.display());
        }
        return Ok(());
    }

    let server_names = config.hosts.join(" ");
    let (cert_path, key_path) = match config.ssl.strategy {
        SslStrategy::Letsencrypt => {
            // Certbot stores certificates under the primary domain.
            let domain = config.primary_host();
            (
                format!("/etc/letsencrypt/live/{domain}/fullchain.pem"),
                format!("/etc/letsencrypt/live/{domain}/privkey.pem"),
            )
        }
        _ => (
            "/etc/nginx/certs/opal.crt".to_string(),
            "/etc/nginx/certs/opal.key".to_string(),
        ),
    };

    let rendered = template::render(
        template::NGINX_HTTPS,
        &[
            ("OPAL_HOSTNAME", server_names.as_str()),
            ("SSL_CERT_PATH", cert_path.as_str()),
            ("SSL_KEY_PATH", key_path.as_str()),
        ],
    );

    let conf_dir = workspace.nginx_conf_dir();
    std::fs::create_dir_all(&conf_dir)?;
    let output_path = workspace.nginx_conf_file();
    std::fs::write(&output_path, rendered)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    info!("NGINX configuration written to {}", output_path.display());

    let html_dir = workspace.html_dir();
    std::fs::create_dir_all(&html_dir)?;
    let maintenance_path = html_dir.join("maintenance.html");
    std::fs::write(&maintenance_path, template::MAINTENANCE_PAGE)
        .with_context(|| format!("failed to write {}", maintenance_path.display()))?;
    info!("maintenance page installed at {}", maintenance_path.display());

    Ok(())
}
