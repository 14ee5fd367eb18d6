/// データベース接続の初期化とテーブル作成
pub mod connection;

pub use connection::{create_tables, get_database_path, initialize_database};
