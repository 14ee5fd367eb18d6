use crate::shared::config::{get_database_filename, get_environment};
use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::PathBuf;

/// データベース接続を初期化し、テーブルを作成する
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
///
/// # 処理内容
/// 1. アプリケーションデータディレクトリの確保
/// 2. データベースファイルパスの決定
/// 3. データベース接続の開設
/// 4. テーブルとインデックスの作成
pub fn initialize_database() -> AppResult<Connection> {
    // データベースファイルパスを取得
    let database_path = get_database_path()?;

    // データベース接続を開く
    let conn = Connection::open(&database_path)?;

    // テーブルを作成
    create_tables(&conn)?;

    log::info!("データベースを初期化しました: {:?}", database_path);

    Ok(conn)
}

/// アプリデータディレクトリ内のデータベースファイルパスを取得する
///
/// # 戻り値
/// データベースファイルのパス、または失敗時はエラー
pub fn get_database_path() -> AppResult<PathBuf> {
    // アプリケーションデータディレクトリを取得
    let data_dir = dirs::data_dir()
        .ok_or_else(|| AppError::configuration("アプリデータディレクトリの取得に失敗"))?
        .join("eventex");

    // ディレクトリが存在しない場合は作成
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            AppError::configuration(format!("アプリデータディレクトリの作成に失敗: {e}"))
        })?;
        log::info!("アプリケーションデータディレクトリを作成: {:?}", data_dir);
    }

    // 環境に応じたデータベースファイル名を決定
    let db_filename = get_database_filename(get_environment());
    let database_path = data_dir.join(db_filename);

    Ok(database_path)
}

/// データベーステーブルを作成する
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    create_subscriptions_table(conn)?;
    create_indexes(conn)?;

    Ok(())
}

/// 申し込みテーブルを作成する
///
/// email/phoneは任意入力のため、未入力は空文字列として保存する。
/// paidは管理側の外部プロセスのみが更新するフラグ（デフォルト未払い）。
fn create_subscriptions_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subscriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            cpf TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            paid INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    Ok(())
}

/// インデックスを作成する
fn create_indexes(conn: &Connection) -> AppResult<()> {
    // 管理画面のフィルタリング対象カラムのインデックス
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_created_at ON subscriptions(created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_paid ON subscriptions(paid)",
        [],
    )?;

    Ok(())
}
