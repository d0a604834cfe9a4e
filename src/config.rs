//! Environment configuration read once at cold start.

use crate::core::{CUSTOM_HOST_VARIABLE, EventTranslator};

/// Environment variable holding the base path stripped from inbound paths.
pub const BASE_PATH_VARIABLE: &str = "SERVERLESS_BASE_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Origin used when building request URLs
    pub server_address: Option<String>,
    /// Prefix removed from every inbound path
    pub base_path: Option<String>,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Empty
    /// values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            server_address: read(CUSTOM_HOST_VARIABLE),
            base_path: read(BASE_PATH_VARIABLE),
        }
    }

    /// A translator configured with these settings.
    #[must_use]
    pub fn translator(&self) -> EventTranslator {
        let mut translator = EventTranslator::new();
        if let Some(address) = &self.server_address {
            translator = translator.with_server_address(address.as_str());
        }
        if let Some(base_path) = &self.base_path {
            translator.strip_base_path(base_path);
        }
        translator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn reads_both_variables() {
        let config = Config::from_lookup(lookup(&[
            (CUSTOM_HOST_VARIABLE, "https://example.com"),
            (BASE_PATH_VARIABLE, "/api/"),
        ]));
        assert_eq!(config.server_address.as_deref(), Some("https://example.com"));
        assert_eq!(config.translator().base_path(), "/api");
    }

    #[test]
    fn blank_values_are_unset() {
        let config = Config::from_lookup(lookup(&[(BASE_PATH_VARIABLE, "  ")]));
        assert_eq!(config, Config::default());
        assert_eq!(config.translator().base_path(), "");
    }
}
