pub mod error;
pub mod settings;

pub use error::*;
pub use settings::{RepositorySettings, Settings};

use std::path::PathBuf;

/// 設定ファイルを直接指定する環境変数
pub const CONFIG_PATH_VAR: &str = "SHIPFLOW_CONFIG";

const CANDIDATES: [&str; 2] = ["shipflow.yaml", ".shipflow.yaml"];

/// グローバル設定ファイルのパス (~/.config/shipflow/config.yaml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("shipflow").join("config.yaml"))
}

/// shipflow の設定ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 SHIPFLOW_CONFIG (直接パス指定)
/// 2. カレントディレクトリ: shipflow.yaml, .shipflow.yaml
/// 3. ~/.config/shipflow/config.yaml (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_VAR) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(path = %path.display(), "{} が存在しないファイルを指しています", CONFIG_PATH_VAR);
    }

    // 2. カレントディレクトリで検索
    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. グローバル設定
    if let Some(global_config) = global_config_path()
        && global_config.exists()
    {
        return Ok(global_config);
    }

    Err(ConfigError::ConfigFileNotFound)
}
