/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// デバッグモードの有効/無効
    pub debug_mode: bool,
    /// ログレベル
    pub log_level: String,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 戻り値
    /// 環境設定
    pub fn from_env() -> Self {
        let environment = get_environment();
        let debug_mode = environment == Environment::Development;
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if debug_mode {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            debug_mode,
            log_level,
        }
    }
}

/// 現在の実行環境を判定する
///
/// # 戻り値
/// 現在の実行環境（Development または Production）
///
/// # 判定ロジック
/// 1. コンパイル時埋め込み環境変数を最優先
/// 2. 実行時環境変数 ENVIRONMENT を確認
/// 3. デバッグビルドの場合は Development
/// 4. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    // コンパイル時埋め込み環境変数を最優先
    if let Some(embedded_env) = option_env!("EMBEDDED_ENVIRONMENT") {
        let env = match embedded_env {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: コンパイル時埋め込み値を使用 -> {embedded_env} -> {env:?}");
        return env;
    }

    // 実行時環境変数を確認
    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        let env = match env_var.as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: 実行時環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    // フォールバック: ビルド設定に基づく判定
    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

/// 環境に応じたデータベースファイル名を取得する
///
/// # 引数
/// * `env` - 実行環境
///
/// # 戻り値
/// データベースファイル名
///
/// # ファイル名の規則
/// - 開発環境: "dev_eventex.db"
/// - プロダクション環境: "eventex.db"
pub fn get_database_filename(env: Environment) -> &'static str {
    match env {
        Environment::Development => "dev_eventex.db",
        Environment::Production => "eventex.db",
    }
}

/// 環境に応じた.envファイルを読み込む
///
/// # 処理内容
/// 1. コンパイル時埋め込み環境変数をチェック
/// 2. 環境に応じた.envファイルを読み込み
/// 3. フォールバック処理
pub fn load_environment_variables() {
    // コンパイル時に埋め込まれた環境設定があるかチェック
    let embedded_env = option_env!("EMBEDDED_ENVIRONMENT");

    if let Some(env) = embedded_env {
        log::info!("コンパイル時埋め込み環境設定を使用: {env}");
        // コンパイル時に埋め込まれた環境変数がある場合は、実行時読み込みをスキップ
        return;
    }

    // まず、ENVIRONMENTが設定されているかチェック
    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    // 環境に応じた.envファイルのパスを決定
    let env_file = match environment.as_str() {
        "production" => ".env.production",
        "development" => ".env",
        _ => ".env", // デフォルトは開発環境
    };

    log::info!("環境: {environment}, 読み込み対象: {env_file}");

    // 指定された.envファイルを読み込み
    match dotenv::from_filename(env_file) {
        Ok(_) => {
            log::info!("{env_file}ファイルを読み込みました");
        }
        Err(_) => {
            // 環境固有のファイルがない場合は、デフォルトの.envを試行
            if env_file != ".env" {
                match dotenv::dotenv() {
                    Ok(_) => {
                        log::warn!(
                            "{env_file}が見つからないため、デフォルトの.envファイルを読み込みました"
                        );
                    }
                    Err(_) => {
                        log::warn!("環境変数ファイルが見つかりません。直接設定された環境変数を使用します。");
                    }
                }
            } else {
                log::warn!(
                    ".envファイルが見つかりません。直接設定された環境変数を使用します。"
                );
            }
        }
    }
}

/// ログシステムを初期化する
///
/// # 処理内容
/// 1. 環境設定を取得
/// 2. ログレベルを設定
/// 3. env_loggerを初期化
pub fn initialize_logging_system() {
    // 環境設定を取得
    let env_config = EnvironmentConfig::from_env();

    // ログレベルを設定
    let log_level = match env_config.log_level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };

    // env_loggerを初期化
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .init();

    log::info!(
        "ログシステムを初期化しました: level={}, environment={}",
        env_config.log_level,
        env_config.environment
    );
}

/// HTTPサーバーの設定を管理する構造体
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// バインドするホスト
    pub host: String,
    /// バインドするポート番号
    pub port: u16,
}

impl ServerConfig {
    /// 環境変数からサーバー設定を読み込む
    ///
    /// # 戻り値
    /// サーバー設定（未設定の項目はデフォルト値を使用）
    ///
    /// # デフォルト値
    /// - HOST: "127.0.0.1"
    /// - PORT: 8000
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| {
            log::debug!("HOST が設定されていないため、デフォルト値 '127.0.0.1' を使用");
            "127.0.0.1".to_string()
        });

        let port = std::env::var("PORT")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or_else(|| {
                log::debug!("PORT が設定されていないため、デフォルト値 8000 を使用");
                8000
            });

        Self { host, port }
    }

    /// バインド先アドレス文字列を取得
    ///
    /// # 戻り値
    /// "host:port" 形式のアドレス
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// SMTP（確認メール送信）の設定を管理する構造体
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTPサーバーのホスト名
    pub host: String,
    /// SMTPサーバーのポート番号
    pub port: u16,
    /// SMTP認証ユーザー名
    pub username: String,
    /// SMTP認証パスワード
    pub password: String,
}

impl SmtpConfig {
    /// 環境変数からSMTP設定を読み込む
    ///
    /// # 戻り値
    /// SMTP設定、または設定が不完全な場合はNone
    pub fn from_env() -> Option<Self> {
        log::debug!("SmtpConfig::from_env() - 環境変数の読み込みを開始");

        let host = match std::env::var("SMTP_HOST") {
            Ok(val) => {
                log::debug!("SMTP_HOST が見つかりました: {val}");
                val
            }
            Err(_) => {
                log::warn!("SMTP_HOST が見つかりません");
                return None;
            }
        };

        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or_else(|| {
                log::debug!("SMTP_PORT が設定されていないため、デフォルト値 587 を使用");
                587
            });

        let username = match std::env::var("SMTP_USERNAME") {
            Ok(val) => {
                log::debug!("SMTP_USERNAME が見つかりました: {}", mask_credential(&val));
                val
            }
            Err(_) => {
                log::warn!("SMTP_USERNAME が見つかりません");
                return None;
            }
        };

        let password = match std::env::var("SMTP_PASSWORD") {
            Ok(val) => val,
            Err(_) => {
                log::warn!("SMTP_PASSWORD が見つかりません");
                return None;
            }
        };

        log::debug!("SmtpConfig::from_env() - 設定の読み込みが完了しました");
        Some(Self {
            host,
            port,
            username,
            password,
        })
    }
}

/// 資格情報の先頭4文字だけを残してマスクする
///
/// 文字単位で切り出すため、マルチバイト文字を含む値でも安全。
fn mask_credential(value: &str) -> String {
    format!("{}****", value.chars().take(4).collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_database_filename() {
        // 開発環境のデータベースファイル名をテスト
        assert_eq!(
            get_database_filename(Environment::Development),
            "dev_eventex.db"
        );

        // プロダクション環境のデータベースファイル名をテスト
        assert_eq!(get_database_filename(Environment::Production), "eventex.db");
    }

    #[test]
    fn test_environment_equality() {
        // Environment列挙型の等価性をテスト
        assert_eq!(Environment::Development, Environment::Development);
        assert_eq!(Environment::Production, Environment::Production);
        assert_ne!(Environment::Development, Environment::Production);
    }

    #[test]
    fn test_get_environment() {
        // 現在の環境を取得（実際の値はビルド設定に依存）
        let env = get_environment();

        // デバッグビルドかリリースビルドかのいずれかであることを確認
        assert!(matches!(
            env,
            Environment::Development | Environment::Production
        ));
    }

    #[test]
    fn test_environment_config_from_env() {
        let config = EnvironmentConfig::from_env();

        // 設定が適切に読み込まれることを確認
        assert!(config.environment == "development" || config.environment == "production");
        assert!(!config.log_level.is_empty());
    }

    #[test]
    fn test_server_config_defaults() {
        // HOST/PORT未設定時のデフォルト値をテスト
        // （環境変数が設定されている場合はその値が使われる）
        let config = ServerConfig::from_env();
        assert!(!config.host.is_empty());
        assert!(config.port > 0);
        assert!(config.bind_address().contains(':'));
    }

    #[test]
    fn test_mask_credential() {
        assert_eq!(mask_credential("contato@eventex.com.br"), "cont****");
        assert_eq!(mask_credential("ab"), "ab****");
        assert_eq!(mask_credential(""), "****");
    }

    #[test]
    fn test_mask_credential_handles_multibyte() {
        // マルチバイト文字を含む値でもパニックしない
        assert_eq!(mask_credential("担当者アドレス"), "担当者ア****");
        assert_eq!(mask_credential("ça@exemplo.com"), "ça@e****");
    }
}
