use crate::features::admin;
use crate::features::subscriptions::handlers;
use crate::AppState;
use hyper::{Method, Response};

/// リクエストを対応するハンドラに振り分ける
///
/// ボディは呼び出し前に文字列へ読み込み済みのため、この関数は
/// 同期的でテストしやすい。
///
/// # 引数
/// * `method` - HTTPメソッド
/// * `path` - リクエストパス
/// * `query` - クエリ文字列（なければ空文字列）
/// * `body` - リクエストボディ
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// HTTPレスポンス
pub fn route(
    method: &Method,
    path: &str,
    query: &str,
    body: &str,
    state: &AppState,
) -> Response<String> {
    match (method, path) {
        (&Method::GET, "/subscriptions/new") => handlers::new_subscription_form(),
        (&Method::POST, "/subscriptions/new") => handlers::create_subscription(state, body),
        (&Method::GET, "/admin/subscriptions") => admin::listing(state, query),
        (&Method::GET, detail_path) => match detail_path.strip_prefix("/subscriptions/") {
            Some(id_segment) => handlers::subscription_detail(state, id_segment),
            None => {
                log::debug!("未対応のリクエスト: {method} {path}");
                handlers::not_found_response()
            }
        },
        _ => {
            log::debug!("未対応のリクエスト: {method} {path}");
            handlers::not_found_response()
        }
    }
}
