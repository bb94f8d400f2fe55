use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::pipeline::normalize::CityAliases;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Extra city alias entries, merged over the built-in table
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Built-in aliases with the file's entries layered on top
    pub fn city_aliases(&self) -> CityAliases {
        let mut aliases = CityAliases::default();
        aliases.extend(self.aliases.clone());
        aliases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::normalize_city;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_alias_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        fs::write(
            &path,
            "[aliases]\n\"Bombay\" = \"Mumbai\"\n\"Saigon\" = \"Ho Chi Minh City\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        let aliases = config.city_aliases();

        // File entries and built-ins both resolve
        assert_eq!(normalize_city(Some("Bombay"), &aliases), "Mumbai");
        assert_eq!(normalize_city(Some("New York"), &aliases), "New York City");
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(
            Config::load(&path).unwrap_err(),
            PipelineError::Config(_)
        ));
    }

    #[test]
    fn test_empty_config_still_has_builtin_aliases() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        let aliases = config.city_aliases();

        assert_eq!(normalize_city(Some("New York"), &aliases), "New York City");
    }
}
