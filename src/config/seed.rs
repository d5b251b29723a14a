//! Seed configuration loaded from `config.toml`.
//!
//! The file declares the platform's super admin account and the role and
//! permission catalog that authorizations can grant.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct SeedConfig {
    /// Super admin account, created when no user with this email exists
    pub admin: Option<AdminConfig>,
    /// Roles to make available
    #[serde(default)]
    pub roles: Vec<CatalogEntryConfig>,
    /// Permissions to make available
    #[serde(default)]
    pub permissions: Vec<CatalogEntryConfig>,
}

/// The bootstrap super admin
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
}

/// One role or permission entry
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogEntryConfig {
    /// Unique name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
}

/// Loads seed configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads seed configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<SeedConfig> {
    load_config("config.toml")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_seed_config() {
        let toml_str = r#"
            [admin]
            name = "Root"
            email = "root@example.com"

            [[roles]]
            name = "mentor"
            description = "Guides learners"

            [[roles]]
            name = "reviewer"

            [[permissions]]
            name = "edit_projects"
        "#;

        let config: SeedConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.admin.unwrap().email, "root@example.com");
        assert_eq!(config.roles.len(), 2);
        assert_eq!(config.roles[0].description.as_deref(), Some("Guides learners"));
        assert!(config.roles[1].description.is_none());
        assert_eq!(config.permissions[0].name, "edit_projects");
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: SeedConfig = toml::from_str("").unwrap();
        assert!(config.admin.is_none());
        assert!(config.roles.is_empty());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
