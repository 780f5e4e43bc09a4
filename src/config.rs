use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StreamnestConfig {
    pub api_port: u16,
    pub paths: StreamnestPaths,
    pub comments: CommentConfig,
}

impl StreamnestConfig {
    pub fn from_env() -> Result<Self> {
        let paths = StreamnestPaths::discover()?;
        let api_port = env::var("STREAMNEST_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        let comments = CommentConfig::from_env();
        Ok(Self {
            api_port,
            paths,
            comments,
        })
    }

    pub fn new(api_port: u16, paths: StreamnestPaths) -> Self {
        Self {
            api_port,
            paths,
            comments: CommentConfig::from_env(),
        }
    }

    pub fn with_comments(api_port: u16, paths: StreamnestPaths, comments: CommentConfig) -> Self {
        Self {
            api_port,
            paths,
            comments,
        }
    }
}

/// Paging limits for comment listings.
#[derive(Debug, Clone)]
pub struct CommentConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl CommentConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let default_page_size = env::var("STREAMNEST_DEFAULT_PAGE_SIZE")
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|size| *size >= 1)
            .unwrap_or(defaults.default_page_size);
        let max_page_size = env::var("STREAMNEST_MAX_PAGE_SIZE")
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|size| *size >= 1)
            .unwrap_or(defaults.max_page_size);
        Self {
            default_page_size,
            max_page_size,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreamnestPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl StreamnestPaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("streamnest.db");
        let logs_dir = base.join("logs");

        Ok(Self {
            base,
            data_dir,
            db_path,
            logs_dir,
        })
    }
}
