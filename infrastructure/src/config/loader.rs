//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "llm-council";
const PROJECT_FILES: [&str; 2] = ["council.toml", ".council.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided)
    /// 2. Project root: `./council.toml` or `./.council.toml`
    /// 3. XDG config: `$XDG_CONFIG_HOME/llm-council/config.toml`
    /// 4. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut sources = Vec::new();

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            sources.push(global_path);
        }
        if let Some(project_path) = Self::project_config_path() {
            sources.push(project_path);
        }
        if let Some(path) = config_path {
            sources.push(path.clone());
        }

        Self::load_from(&sources)
    }

    /// Merge the given files over the defaults, later files winning
    pub fn load_from<P: AsRef<Path>>(sources: &[P]) -> Result<FileConfig, Box<figment::Error>> {
        sources
            .iter()
            .fold(
                Figment::new().merge(Serialized::defaults(FileConfig::default())),
                |figment, path| figment.merge(Toml::file(path.as_ref())),
            )
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns `$XDG_CONFIG_HOME/llm-council/config.toml` (or the platform
    /// equivalent) even if the file does not exist.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources() {
        println!("Configuration sources (in priority order):");

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./council.toml or ./.council.toml");
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
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.nodes.is_empty());
        assert_eq!(config.dispatch.max_retries, 2);
        assert_eq!(config.council.max_iterations, 2);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path().unwrap();
        assert!(path.to_string_lossy().contains(APP_DIR));
    }

    #[test]
    fn test_later_sources_override_earlier() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        let explicit = dir.path().join("explicit.toml");
        fs::write(
            &global,
            r#"
[[nodes]]
name = "home"
models = ["qwen3:4b"]

[dispatch]
max_retries = 5
retry_delay_ms = 200
"#,
        )
        .unwrap();
        fs::write(
            &explicit,
            r#"
[dispatch]
max_retries = 0

[output]
color = false
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from(&[&global, &explicit]).unwrap();
        assert_eq!(config.nodes.len(), 1);
        assert_eq!(config.nodes[0].name, "home");
        assert_eq!(config.dispatch.max_retries, 0);
        assert_eq!(config.dispatch.retry_delay_ms, 200);
        assert_eq!(config.dispatch.default_timeout_seconds, 120);
        assert!(!config.output.color);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[dispatch]\nmax_retries = \"many\"\n").unwrap();

        assert!(ConfigLoader::load_from(&[&path]).is_err());
    }
}
