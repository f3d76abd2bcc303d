//! Templates baked into the binary and the `${NAME}` substitution used to
//! render them. The tool ships as a single executable, so the rendered
//! files cannot depend on a source checkout being present.

/// HTTPS reverse-proxy configuration for the nginx container.
pub const NGINX_HTTPS: &str = include_str!("../templates/nginx.conf.tpl");

/// Compose file describing the Opal stack.
pub const DOCKER_COMPOSE: &str = include_str!("../templates/docker-compose.yml.tpl");

/// Static page nginx serves while Opal is unavailable.
pub const MAINTENANCE_PAGE: &str = include_str!("../templates/maintenance.html");

/// Replace every `${NAME}` token with its value. Tokens without a
/// substitution are left in place, so nginx runtime variables like `$host`
/// pass through untouched.
pub fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (name, value) in substitutions {
        result = result.replace(&format!("${{{name}}}"), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_all_occurrences() {
        let rendered = render(
            "server_name ${HOST};\n# ${HOST} again",
            &[("HOST", "opal.example.org")],
        );
        assert_eq!(
            rendered,
            "server_name opal.example.org;\n# opal.example.org again"
        );
    }

    #[test]
    fn unknown_tokens_are_left_in_place() {
        let rendered = render("proxy_set_header Host $host; ${NOT_SET}", &[]);
        assert_eq!(rendered, "proxy_set_header Host $host; ${NOT_SET}");
    }

    #[test]
    fn embedded_templates_carry_expected_tokens() {
        assert!(NGINX_HTTPS.contains("${OPAL_HOSTNAME}"));
        assert!(NGINX_HTTPS.contains("${SSL_CERT_PATH}"));
        assert!(NGINX_HTTPS.contains("${SSL_KEY_PATH}"));
        assert!(DOCKER_COMPOSE.contains("${PROJECT_NAME}"));
        assert!(DOCKER_COMPOSE.contains("${OPAL_EXTERNAL_PORT}"));
        assert!(MAINTENANCE_PAGE.contains("<html"));
    }
}
