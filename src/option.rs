//! Proxy option

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_CACHE_DIR: &str = ".proxy_cache";
pub const DEFAULT_ERROR_PAGE: &str = "404.html";
pub const DEFAULT_BUF_SIZE: usize = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyOption {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_error_page")]
    pub error_page: PathBuf,
    #[serde(default = "default_buf_size")]
    pub buf_size: usize,
}

impl Default for ProxyOption {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cache_dir: default_cache_dir(),
            error_page: default_error_page(),
            buf_size: default_buf_size(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

fn default_error_page() -> PathBuf {
    PathBuf::from(DEFAULT_ERROR_PAGE)
}

fn default_buf_size() -> usize {
    DEFAULT_BUF_SIZE
}
