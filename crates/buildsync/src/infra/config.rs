//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".buildsync/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub dispatch: Dispatch,
    #[serde(default)]
    pub workspace: Workspace,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispatch {
    /// Worker threads used to run synchronization tasks.
    #[serde(default = "Dispatch::default_workers")]
    pub workers: usize,
    #[serde(default = "Dispatch::default_thread_prefix")]
    pub thread_prefix: String,
}

impl Dispatch {
    fn default_workers() -> usize {
        2
    }

    fn default_thread_prefix() -> String {
        "buildsync-sync".into()
    }
}

impl Default for Dispatch {
    fn default() -> Self {
        Self {
            workers: Self::default_workers(),
            thread_prefix: Self::default_thread_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Workspace manifest, relative to the workspace root unless absolute.
    #[serde(default = "Workspace::default_manifest")]
    pub manifest: String,
}

impl Workspace {
    fn default_manifest() -> String {
        ".buildsync/workspace.toml".into()
    }

    /// Resolve the manifest location against `root`.
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        let manifest = Path::new(&self.manifest);
        if manifest.is_absolute() {
            manifest.to_path_buf()
        } else {
            root.join(manifest)
        }
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            manifest: Self::default_manifest(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logging {
    #[serde(default = "Logging::default_level")]
    pub level: String,
}

impl Logging {
    fn default_level() -> String {
        "warn".into()
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    workers: Option<usize>,
    log_level: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            workers: env::var("BUILDSYNC_WORKERS")
                .ok()
                .and_then(|value| value.trim().parse().ok()),
            log_level: env::var("BUILDSYNC_LOG").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(workers: usize, log_level: &str) -> Self {
        Self {
            workers: Some(workers),
            log_level: Some(log_level.to_owned()),
        }
    }
}

/// One configuration file. Only keys present in the file override lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct ConfigLayer {
    #[serde(default)]
    dispatch: DispatchLayer,
    #[serde(default)]
    workspace: WorkspaceLayer,
    #[serde(default)]
    logging: LoggingLayer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct DispatchLayer {
    workers: Option<usize>,
    thread_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct WorkspaceLayer {
    manifest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
struct LoggingLayer {
    level: Option<String>,
}

impl ConfigLayer {
    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&data)
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())
    }
}

impl Config {
    /// Load defaults, the user config, `<root>/.buildsync/config.toml`, then env overrides.
    pub fn load_for_root(root: &Path) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH));
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<ConfigLayer> = Vec::new();

        layers.push(ConfigLayer::parse(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(ConfigLayer::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(ConfigLayer::from_file(&workspace_path)?);
        }

        let merged = layers
            .into_iter()
            .fold(Config::default(), |config, layer| config.merge(layer));
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn merge(mut self, layer: ConfigLayer) -> Self {
        if let Some(workers) = layer.dispatch.workers {
            self.dispatch.workers = workers;
        }
        if let Some(prefix) = layer.dispatch.thread_prefix {
            self.dispatch.thread_prefix = prefix;
        }
        if let Some(manifest) = layer.workspace.manifest {
            self.workspace.manifest = manifest;
        }
        if let Some(level) = layer.logging.level {
            self.logging.level = level;
        }
        self
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("buildsync/config.toml"))
}

/// Walk upwards from `start` to the first directory holding `.buildsync/` or `.git`.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".buildsync").is_dir() || current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(workers) = env.workers {
        config.dispatch.workers = workers;
    }
    if let Some(level) = env.log_level {
        config.logging.level = level;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.dispatch.workers, 2);
        assert_eq!(config.workspace.manifest, ".buildsync/workspace.toml");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[dispatch]
workers = 8
[logging]
level = "debug"
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".buildsync"))?;
        fs::write(
            workspace_dir.join(".buildsync/config.toml"),
            r#"
[workspace]
manifest = "builds.toml"
[logging]
level = "info"
"#,
        )?;

        let config = Config::load_with_layers(
            Some(global),
            Some(workspace_dir.join(".buildsync/config.toml")),
            EnvOverrides::default(),
        )?;

        assert_eq!(config.dispatch.workers, 8);
        assert_eq!(config.workspace.manifest, "builds.toml");
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.workspace.manifest_path(&workspace_dir),
            workspace_dir.join("builds.toml")
        );
        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests(5, "trace");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.dispatch.workers, 5);
        assert_eq!(config.logging.level, "trace");
        Ok(())
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        assert!(ConfigLayer::from_file(&file).is_err());
        Ok(())
    }

    #[test]
    fn explicit_default_value_overrides_lower_layer() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("global.toml");
        fs::write(&global, "[dispatch]\nworkers = 8\n[logging]\nlevel = \"debug\"\n")?;
        let workspace = temp.path().join("workspace.toml");
        fs::write(&workspace, "[dispatch]\nworkers = 2\n[logging]\nlevel = \"warn\"\n")?;

        let config =
            Config::load_with_layers(Some(global), Some(workspace), EnvOverrides::default())?;
        assert_eq!(config.dispatch.workers, 2);
        assert_eq!(config.logging.level, "warn");
        Ok(())
    }

    #[test]
    fn workspace_root_is_found_from_nested_directory() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("ws");
        let nested = root.join("app/src/main");
        fs::create_dir_all(root.join(".buildsync"))?;
        fs::create_dir_all(&nested)?;
        assert_eq!(find_workspace_root(&nested), Some(root));
        Ok(())
    }
}
