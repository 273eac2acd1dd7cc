use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Rows per page when neither the flag nor the config sets one
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServicosConfig {
    pub database: Option<String>,
    pub page_size: Option<u32>,
    #[serde(default)]
    pub company: CompanyInfo,
}

/// Letterhead printed at the foot of every service order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyInfo {
    pub name: String,
    pub address: String,
    pub email: String,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: "[NOME DA EMPRESA]".to_string(),
            address: "Rua Florida, Minha Cidade - Meu Estado".to_string(),
            email: "meuemail@mail.com".to_string(),
        }
    }
}

impl ServicosConfig {
    /// Database path from the config, or the default location
    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("servicos.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("data").join("servicos.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ServicosConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ServicosConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ServicosConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
