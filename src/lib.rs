pub mod features;
pub mod server;
pub mod shared;

use features::subscriptions::mailer::Mailer;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// アプリケーション状態（データベース接続とメーラーを保持）
pub struct AppState {
    pub db: Mutex<Connection>,
    pub mailer: Arc<dyn Mailer>,
}
