/// 環境判定と設定読み込み
pub mod environment;

pub use environment::{
    get_database_filename, get_environment, initialize_logging_system, load_environment_variables,
    Environment, EnvironmentConfig, ServerConfig, SmtpConfig,
};
