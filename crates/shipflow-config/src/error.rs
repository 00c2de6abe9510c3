use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "設定ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: shipflow.yaml, .shipflow.yaml\n\
        - ~/.config/shipflow/config.yaml\n\
        または SHIPFLOW_CONFIG 環境変数で直接指定できます"
    )]
    ConfigFileNotFound,

    #[error("不正な設定値 {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("YAML パースエラー: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
