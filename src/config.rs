//! Registry configuration.

use crate::error::ConfigError;

/// Tunables for a [`Registry`](crate::registry::Registry).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Name of the in-memory role consulted for principals with no record.
    pub default_role_name: String,
    /// Query suffix that switches a query to descendant semantics.
    pub wildcard_suffix: String,
    /// Upper bound on parent links followed by a wildcard walk.
    pub max_parent_depth: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            default_role_name: "default".to_string(),
            wildcard_suffix: ".*".to_string(),
            max_parent_depth: 64,
        }
    }
}

impl RegistryConfig {
    /// Reads a config from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Splits a query into its root and whether it was a wildcard query.
    pub fn split_query<'a>(&self, query: &'a str) -> (&'a str, bool) {
        let trimmed = query.trim();
        match trimmed.strip_suffix(self.wildcard_suffix.as_str()) {
            Some(root) if !self.wildcard_suffix.is_empty() => (root, true),
            _ => (trimmed, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = RegistryConfig::from_json(r#"{ "default_role_name": "guest" }"#).unwrap();
        assert_eq!(cfg.default_role_name, "guest");
        assert_eq!(cfg.wildcard_suffix, ".*");
        assert_eq!(cfg.max_parent_depth, 64);
    }

    #[test]
    fn test_bad_json_is_a_config_error() {
        let err = RegistryConfig::from_json(r#"{ "max_parent_depth": "deep" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Invalid registry config"));
    }

    #[test]
    fn test_split_query() {
        let cfg = RegistryConfig::default();
        assert_eq!(cfg.split_query("server.kick.*"), ("server.kick", true));
        assert_eq!(cfg.split_query(" server.kick "), ("server.kick", false));
        assert_eq!(cfg.split_query(".*"), ("", true));
    }
}
