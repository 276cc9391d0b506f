use crate::client::{AnalysisClient, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use anyhow::{anyhow, Result};
use dialoguer::{theme::ColorfulTheme, Input};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const CONFIG_FILE: &str = ".r2s.yml";
const GLOBAL_CONFIG_DIR: &str = ".config/repo2score";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Empty lets the service choose the branch.
    #[serde(default)]
    pub default_branch: String,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_branch: String::new(),
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            Ok(serde_yaml::from_str(&content)?)
        } else if let Some(global_config) = Self::load_global()? {
            Ok(global_config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, project_dir: &Path) -> Result<()> {
        let config_path = project_dir.join(CONFIG_FILE);
        fs::write(&config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    fn global_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn load_global() -> Result<Option<Self>> {
        match Self::global_path() {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(&path)?;
                Ok(Some(serde_yaml::from_str(&content)?))
            }
            _ => Ok(None),
        }
    }

    pub fn save_global(&self) -> Result<()> {
        let path = Self::global_path().ok_or_else(|| anyhow!("cannot locate home directory"))?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

pub async fn configure_interactive(project_dir: &Path, global: bool) -> Result<()> {
    let theme = ColorfulTheme::default();
    let current_config = if global {
        Config::load_global()?.unwrap_or_default()
    } else {
        Config::load(project_dir)?
    };
    if global {
        info!("editing global configuration");
    } else {
        info!("editing project configuration in {}", project_dir.display());
    }

    let api_url: String = Input::with_theme(&theme)
        .with_prompt("Analysis service URL")
        .with_initial_text(&current_config.api_url)
        .interact_text()?;
    let timeout_secs: u64 = Input::with_theme(&theme)
        .with_prompt("Request timeout (seconds)")
        .default(current_config.timeout_secs)
        .interact_text()?;
    let default_branch: String = Input::with_theme(&theme)
        .with_prompt("Default branch (empty = service default)")
        .with_initial_text(&current_config.default_branch)
        .allow_empty(true)
        .interact_text()?;

    let new_config = Config {
        api_url,
        timeout_secs,
        default_branch,
        cache_dir: current_config.cache_dir,
    };

    match AnalysisClient::new(&new_config.api_url, Duration::from_secs(10)) {
        Ok(client) => match client.health().await {
            Ok(()) => info!("analysis service at {} is reachable", client.base_url()),
            Err(e) => warn!("analysis service health check failed: {}", e),
        },
        Err(e) => warn!("invalid service URL: {}", e),
    }

    if global {
        new_config.save_global()?;
        info!("global configuration updated");
    } else {
        new_config.save(project_dir)?;
        info!("project configuration updated");
    }
    Ok(())
}

pub fn init_project(project_dir: &Path) -> Result<()> {
    let config_path = project_dir.join(CONFIG_FILE);
    if config_path.exists() {
        return Err(anyhow!("configuration already exists: {}", config_path.display()));
    }
    Config::default().save(project_dir)?;
    info!("created {}", config_path.display());

    let gitignore_path = project_dir.join(".gitignore");
    if gitignore_path.exists() {
        let mut content = fs::read_to_string(&gitignore_path)?;
        if !content.lines().any(|line| line.trim() == CONFIG_FILE) {
            if !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(CONFIG_FILE);
            content.push('\n');
            fs::write(&gitignore_path, content)?;
            info!("added {} to .gitignore", CONFIG_FILE);
        }
    } else {
        fs::write(&gitignore_path, format!("{}\n", CONFIG_FILE))?;
        info!("created .gitignore with {}", CONFIG_FILE);
    }
    Ok(())
}
