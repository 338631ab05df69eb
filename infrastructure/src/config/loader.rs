//! Configuration file loader with multi-source merging

use super::env_clusters::{EnvClusterError, EnvClusters};
use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Project-level config file names, checked in order.
const PROJECT_FILES: &[&str] = &["relay.toml", ".relay.toml"];

/// Errors that prevent a configuration from being loaded at all
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid cluster environment: {0}")]
    Env(#[from] EnvClusterError),
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Cluster environment scheme (`RELAY_CLUSTERS` / `RELAY_A2A_URL`)
    /// 2. `RELAY_*` variables (`__` separates nested keys)
    /// 3. Explicit config path (if provided)
    /// 4. Project root: `./relay.toml` or `./.relay.toml`
    /// 5. XDG config: `$XDG_CONFIG_HOME/cluster-relay/config.toml`
    /// 6. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, ConfigError> {
        let mut config = Self::figment(config_path, Self::project_config_path().as_deref())
            .merge(Self::env_provider())
            .extract::<FileConfig>()
            .map_err(Box::new)?;

        if let Some(env) = EnvClusters::from_env()? {
            Self::apply_env_clusters(&mut config, env);
        }
        Ok(config)
    }

    /// Load only default configuration (for --no-config)
    ///
    /// The environment still applies: a container configured purely through
    /// variables has no file to skip.
    pub fn load_defaults() -> Result<FileConfig, ConfigError> {
        let mut config = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Self::env_provider())
            .extract::<FileConfig>()
            .map_err(Box::new)?;
        if let Some(env) = EnvClusters::from_env()? {
            Self::apply_env_clusters(&mut config, env);
        }
        Ok(config)
    }

    /// File layers only, without the environment.
    fn figment(config_path: Option<&PathBuf>, project: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = project {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// `RELAY_*` variables except the ones owned by the cluster scheme.
    fn env_provider() -> Env {
        Env::prefixed("RELAY_")
            .split("__")
            .ignore(&["clusters", "a2a_url"])
    }

    /// Environment clusters replace file clusters wholesale.
    pub fn apply_env_clusters(config: &mut FileConfig, env: EnvClusters) {
        config.cluster_order = env.names();
        config.clusters = env.clusters.into_iter().collect();
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/cluster-relay/config.toml if set,
    /// otherwise falls back to ~/.config/cluster-relay/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("cluster-relay").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(explicit: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");

        println!("  [ENV  ] RELAY_* variables");

        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "MISS " };
            println!("  [{}] Explicit: {}", mark, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./relay.toml or ./.relay.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file_config::FileClusterConfig;
    use std::io::Write;

    fn write_toml(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_explicit_file_overrides_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = write_toml(
            &dir,
            "relay.toml",
            r#"
token_limit = 100000
timeout_seconds = 60

[clusters.dev]
endpoint = "http://dev/"
"#,
        );
        let explicit = write_toml(&dir, "override.toml", "timeout_seconds = 90\n");

        let config: FileConfig = ConfigLoader::figment(Some(&explicit), Some(project.as_path()))
            .extract()
            .unwrap();
        assert_eq!(config.token_limit, 100_000);
        assert_eq!(config.timeout_seconds, 90);
        assert_eq!(config.clusters["dev"].endpoint, "http://dev/");
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write_toml(&dir, "only.toml", "[planner]\nurl = \"http://p/\"\n");
        let config: FileConfig = ConfigLoader::figment(Some(&explicit), None)
            .extract()
            .unwrap();
        assert_eq!(config.planner.url(), Some("http://p/"));
        assert_eq!(config.planner.timeout_seconds, 30);
        assert_eq!(config.token_limit, 300_000);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = write_toml(&dir, "bad.toml", "token_limit = \"lots\"\n");
        let result = ConfigLoader::figment(Some(&explicit), None).extract::<FileConfig>();
        assert!(result.is_err());
    }

    #[test]
    fn test_env_clusters_replace_file_clusters() {
        let mut config = FileConfig::default();
        config
            .clusters
            .insert("old".to_string(), FileClusterConfig::new("http://old/", vec![]));

        ConfigLoader::apply_env_clusters(
            &mut config,
            EnvClusters {
                clusters: vec![
                    ("test".to_string(), FileClusterConfig::new("http://t/", vec![])),
                    ("dev".to_string(), FileClusterConfig::new("http://d/", vec![])),
                ],
            },
        );

        let registry = config.build_registry().unwrap();
        assert_eq!(registry.names(), vec!["test", "dev"]);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("cluster-relay"));
    }
}
