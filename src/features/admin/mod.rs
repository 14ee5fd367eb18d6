/// 管理画面機能モジュール
///
/// 申し込み一覧の読み取り専用ビューを提供します（絞り込み・検索・
/// 当日申し込み判定列）。作成・更新の操作は提供しません。
pub mod handlers;

// 公開インターフェース
pub use handlers::{listing, parse_filter, subscribed_on};
