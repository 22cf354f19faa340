//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Directory name under the platform config dir
const APP_DIR: &str = "llm-council";

/// Project-level config file names, checked in order
const PROJECT_FILES: [&str; 2] = ["council.toml", ".council.toml"];

/// Prefix of environment overrides, e.g. `COUNCIL_TIMEOUTS__REQUEST_SECS=60`
const ENV_PREFIX: &str = "COUNCIL_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `COUNCIL_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./council.toml` or `./.council.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/llm-council/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(
            Self::global_config_path().as_deref(),
            Self::project_config_path().as_deref(),
            config_path.map(PathBuf::as_path),
        )?
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(Box::new)
    }

    /// File layers only, lowest priority first.
    ///
    /// Missing global and project files are skipped; a missing explicit file
    /// is an error.
    fn figment(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<Figment, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for path in [global, project].into_iter().flatten() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Box::new(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                ))));
            }
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/llm-council/config.toml if set,
    /// otherwise falls back to ~/.config/llm-council/config.toml
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
    pub fn print_config_sources(config_path: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");

        println!("  [     ] Env:     {}* (sections split by __)", ENV_PREFIX);

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:<5}] Explicit: {}", mark, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./{} or ./{}", PROJECT_FILES[0], PROJECT_FILES[1]);
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

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.workers.is_empty());
        assert_eq!(config.timeouts.request_secs, 180);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains(APP_DIR));
    }

    #[test]
    fn test_layers_override_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("council.toml");
        let explicit = dir.path().join("explicit.toml");

        fs::write(
            &global,
            "[timeouts]\nrequest_secs = 60\ntitle_secs = 5\n\n[health]\npoll_interval_secs = 9\n",
        )
        .unwrap();
        fs::write(&project, "[timeouts]\nrequest_secs = 90\n").unwrap();
        fs::write(
            &explicit,
            "[[workers]]\nname = \"alpha\"\nurl = \"http://10.0.0.1:8002\"\n\n[timeouts]\ntitle_secs = 7\n",
        )
        .unwrap();

        let config: FileConfig = ConfigLoader::figment(
            Some(&global),
            Some(&project),
            Some(&explicit),
        )
        .unwrap()
        .extract()
        .unwrap();

        assert_eq!(config.timeouts.request_secs, 90);
        assert_eq!(config.timeouts.title_secs, 7);
        assert_eq!(config.timeouts.health_probe_secs, 2);
        assert_eq!(config.health.poll_interval_secs, 9);
        assert_eq!(config.workers.len(), 1);
        assert_eq!(config.workers[0].role, "reviewer");
    }

    #[test]
    fn test_missing_optional_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let config: FileConfig = ConfigLoader::figment(Some(&missing), Some(&missing), None)
            .unwrap()
            .extract()
            .unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let Err(err) = ConfigLoader::figment(None, None, Some(&missing)) else {
            panic!("missing explicit config file should be rejected");
        };
        assert!(err.to_string().contains("config file not found"));
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("council.toml");
        fs::write(&bad, "[timeouts]\nrequest_secs = \"soon\"\n").unwrap();
        let result: Result<FileConfig, _> = ConfigLoader::figment(None, Some(&bad), None)
            .unwrap()
            .extract();
        assert!(result.is_err());
    }
}
