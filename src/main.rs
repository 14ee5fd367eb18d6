use eventex::features::subscriptions::mailer::{LogMailer, Mailer, SmtpMailer};
use eventex::shared::config::{ServerConfig, SmtpConfig};
use eventex::{server, shared, AppState};
use log::{error, info, warn};
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() {
    // ログシステムを初期化
    shared::config::initialize_logging_system();

    info!("アプリケーション初期化を開始します...");

    // 環境変数を読み込み（.envファイルがある場合）
    shared::config::load_environment_variables();

    // サーバー設定を読み込み
    let server_config = ServerConfig::from_env();

    // 起動時にデータベースを初期化
    info!("データベースを初期化しています...");
    let db_conn = match shared::database::initialize_database() {
        Ok(conn) => conn,
        Err(e) => {
            error!("データベースの初期化に失敗しました: {}", e.details());
            std::process::exit(1);
        }
    };
    info!("データベースの初期化が完了しました");

    // メーラーを初期化（SMTP未設定時はログ出力のみ）
    let mailer: Arc<dyn Mailer> = match SmtpConfig::from_env() {
        Some(config) => match SmtpMailer::from_config(&config) {
            Ok(mailer) => Arc::new(mailer),
            Err(e) => {
                warn!(
                    "SMTPメーラーの初期化に失敗したため、メールはログ出力のみとなります: {}",
                    e.details()
                );
                Arc::new(LogMailer)
            }
        },
        None => {
            warn!("SMTP設定が見つからないため、メールはログ出力のみとなります");
            Arc::new(LogMailer)
        }
    };

    // アプリケーション状態を構築
    let state = Arc::new(AppState {
        db: Mutex::new(db_conn),
        mailer,
    });

    info!("アプリケーション初期化が完了しました");

    // HTTPサーバーを開始
    if let Err(e) = server::run(server_config, state).await {
        error!("HTTPサーバーの実行中にエラーが発生しました: {}", e.details());
        std::process::exit(1);
    }
}
