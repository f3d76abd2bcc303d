//! Generates `docker-compose.yml` from the embedded template, appending one
//! service per configured Rock profile.

use crate::config::{StackConfig, Workspace};
use crate::template;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

/// Shape of a generated Rock profile service entry.
#[derive(Debug, Serialize)]
struct ProfileService {
    image: String,
    container_name: String,
    restart: &'static str,
    networks: Vec<&'static str>,
    depends_on: Vec<&'static str>,
}

/// Render the compose template, add the profile services and write
/// `docker-compose.yml`.
pub fn generate_compose_file(workspace: &Workspace, config: &StackConfig) -> Result<()> {
    let port = config.opal_external_port.to_string();
    let rendered = template::render(
        template::DOCKER_COMPOSE,
        &[
            ("PROJECT_NAME", config.stack_name.as_str()),
            ("OPAL_HOSTNAME", config.primary_host()),
            ("OPAL_ADMIN_PASSWORD", config.opal_admin_password.as_str()),
            ("OPAL_EXTERNAL_PORT", port.as_str()),
        ],
    );

    let mut doc: serde_yaml::Value =
        serde_yaml::from_str(&rendered).context("compose template is not valid YAML")?;
    let services = doc
        .get_mut("services")
        .and_then(serde_yaml::Value::as_mapping_mut)
        .context("compose template has no services mapping")?;

    for profile in &config.profiles {
        let service = ProfileService {
            image: format!("{}:{}", profile.image, profile.tag),
            container_name: format!("{}-{}", config.stack_name, profile.name),
            restart: "always",
            networks: vec!["opal-net"],
            depends_on: vec!["opal"],
        };
        services.insert(
            serde_yaml::Value::String(profile.name.clone()),
            serde_yaml::to_value(&service)?,
        );
    }

    let output_path = workspace.compose_file();
    let yaml = serde_yaml::to_string(&doc)?;
    std::fs::write(&output_path, yaml)
        .with_context(|| format!("failed to write {}", output_path.display()))?;
    info!("compose file written to {}", output_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RockProfile;
    use tempfile::tempdir;

    fn generate(config: &StackConfig) -> serde_yaml::Value {
        let dir = tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        generate_compose_file(&workspace, config).unwrap();
        let yaml = std::fs::read_to_string(workspace.compose_file()).unwrap();
        serde_yaml::from_str(&yaml).unwrap()
    }

    #[test]
    fn substitutes_stack_settings() {
        let mut config = StackConfig::default();
        config.stack_name = "study".to_string();
        config.opal_external_port = 8443;
        config.opal_admin_password = "s3cret".to_string();

        let doc = generate(&config);
        let services = doc.get("services").unwrap();

        let opal = services.get("opal").unwrap();
        assert_eq!(
            opal.get("container_name").unwrap().as_str(),
            Some("study-opal")
        );
        let env: Vec<&str> = opal
            .get("environment")
            .unwrap()
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(env.contains(&"OPAL_ADMINISTRATOR_PASSWORD=s3cret"));

        let ports = services.get("nginx").unwrap().get("ports").unwrap();
        assert_eq!(ports.as_sequence().unwrap()[0].as_str(), Some("8443:443"));
    }

    #[test]
    fn appends_one_service_per_profile() {
        let mut config = StackConfig::default();
        config.profiles = vec![
            RockProfile {
                name: "rock".to_string(),
                image: "datashield/rock-base".to_string(),
                tag: "latest".to_string(),
            },
            RockProfile {
                name: "rock-omics".to_string(),
                image: "datashield/rock-omics".to_string(),
                tag: "6.3".to_string(),
            },
        ];

        let doc = generate(&config);
        let services = doc.get("services").unwrap();

        let rock = services.get("rock").unwrap();
        assert_eq!(
            rock.get("image").unwrap().as_str(),
            Some("datashield/rock-base:latest")
        );
        assert_eq!(
            rock.get("container_name").unwrap().as_str(),
            Some("easy-opal-rock")
        );
        assert_eq!(
            rock.get("depends_on").unwrap().as_sequence().unwrap()[0].as_str(),
            Some("opal")
        );

        let omics = services.get("rock-omics").unwrap();
        assert_eq!(
            omics.get("image").unwrap().as_str(),
            Some("datashield/rock-omics:6.3")
        );
    }

    #[test]
    fn core_services_survive_reserialization() {
        let doc = generate(&StackConfig::default());
        let services = doc.get("services").unwrap().as_mapping().unwrap();
        for name in ["opal", "mongo", "nginx", "certbot"] {
            assert!(
                services.contains_key(&serde_yaml::Value::String(name.to_string())),
                "missing service {name}"
            );
        }
        assert!(doc.get("networks").unwrap().get("opal-net").is_some());
    }
}
