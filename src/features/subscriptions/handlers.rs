use super::forms::SubscriptionForm;
use super::repository;
use super::service;
use super::templates;
use crate::shared::errors::AppError;
use crate::AppState;
use hyper::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::{Response, StatusCode};

/// HTMLレスポンスを組み立てる
pub fn html_response(status: StatusCode, body: String) -> Response<String> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

/// 302リダイレクトレスポンスを組み立てる
fn redirect_response(location: &str) -> Response<String> {
    let mut response = Response::new(String::new());
    *response.status_mut() = StatusCode::FOUND;
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
            response
        }
        Err(e) => {
            log::error!("リダイレクト先の組み立てに失敗しました: {location}: {e}");
            html_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                templates::render_error_page("Ocorreu um erro interno. Tente novamente."),
            )
        }
    }
}

/// 404レスポンスを組み立てる
pub fn not_found_response() -> Response<String> {
    html_response(StatusCode::NOT_FOUND, templates::render_not_found_page())
}

/// 500レスポンスを組み立てる（訪問者向けメッセージはエラー型から導出）
pub fn internal_error_response(error: &AppError) -> Response<String> {
    html_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        templates::render_error_page(error.user_message()),
    )
}

/// GET /subscriptions/new - 空のフォームページを表示する
///
/// # 戻り値
/// フォームページ（200）
pub fn new_subscription_form() -> Response<String> {
    let form = SubscriptionForm::empty();
    html_response(StatusCode::OK, templates::render_form_page(&form))
}

/// POST /subscriptions/new - 申し込みを作成する
///
/// バリデーション成功時は保存・確認メール送信のうえ詳細ページへ
/// リダイレクトする（302）。失敗時はエラー付きのフォームページを
/// 再表示する（200、リダイレクトしない）。
///
/// データベースロックの取得と解放はサービス層が行う（メール送信中に
/// ロックを保持しないため）。
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `body` - リクエストボディ（application/x-www-form-urlencoded）
///
/// # 戻り値
/// 302リダイレクト、またはエラー付きフォームページ（200）
pub fn create_subscription(state: &AppState, body: &str) -> Response<String> {
    let mut form = SubscriptionForm::from_body(body);

    let dto = match form.validate() {
        Some(dto) => dto,
        None => {
            log::debug!(
                "申し込みフォームのバリデーションに失敗しました: field_errors={}, non_field_errors={}",
                form.field_errors.len(),
                form.non_field_errors.len()
            );
            return html_response(StatusCode::OK, templates::render_form_page(&form));
        }
    };

    match service::subscribe(&state.db, state.mailer.as_ref(), &dto) {
        Ok(subscription) => redirect_response(&format!("/subscriptions/{}", subscription.id)),
        Err(e) => {
            log::error!("申し込みの保存に失敗しました: {}", e.details());
            internal_error_response(&e)
        }
    }
}

/// GET /subscriptions/<id> - 申し込み詳細ページを表示する
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `id_segment` - パス中のID部分
///
/// # 戻り値
/// 詳細ページ（200）、または404
pub fn subscription_detail(state: &AppState, id_segment: &str) -> Response<String> {
    // 正の整数でないIDは存在しないものとして扱う
    let id = match id_segment.parse::<i64>() {
        Ok(id) if id > 0 => id,
        _ => return not_found_response(),
    };

    let db = match state.db.lock() {
        Ok(db) => db,
        Err(e) => {
            log::error!("データベースロックエラー: {e}");
            return internal_error_response(&AppError::concurrency(format!(
                "データベースロックエラー: {e}"
            )));
        }
    };

    match repository::find_by_id(&db, id) {
        Ok(subscription) => html_response(
            StatusCode::OK,
            templates::render_detail_page(&subscription),
        ),
        Err(AppError::NotFound(_)) => not_found_response(),
        Err(e) => {
            log::error!("申し込みの取得に失敗しました: {}", e.details());
            internal_error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::subscriptions::mailer::{ConfirmationEmail, Mailer, OutboxMailer};
    use crate::features::subscriptions::models::NewSubscription;
    use crate::shared::database::create_tables;
    use crate::shared::errors::AppResult;
    use rusqlite::Connection;
    use std::sync::{mpsc, Arc, Mutex};
    use std::time::Duration;

    /// 解放されるまで送信中のままブロックするMailer実装
    struct BlockingMailer {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Mailer for BlockingMailer {
        fn send(&self, _email: &ConfirmationEmail) -> AppResult<()> {
            self.entered.lock().unwrap().send(()).ok();
            self.release.lock().unwrap().recv().ok();
            Ok(())
        }
    }

    fn test_state() -> (AppState, Arc<OutboxMailer>) {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let outbox = Arc::new(OutboxMailer::new());
        let mailer: Arc<dyn Mailer> = outbox.clone();

        let state = AppState {
            db: Mutex::new(conn),
            mailer,
        };

        (state, outbox)
    }

    fn record_count(state: &AppState) -> i64 {
        let db = state.db.lock().unwrap();
        repository::count(&db).unwrap()
    }

    #[test]
    fn test_get_new_subscription_form() {
        let response = new_subscription_form();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.body();
        assert!(body.contains("<form"));
        assert_eq!(body.matches("type=\"text\"").count(), 3);
        assert_eq!(body.matches("type=\"email\"").count(), 1);
        assert!(body.contains("type=\"submit"));
    }

    #[test]
    fn test_post_valid_creates_record_and_redirects() {
        let (state, outbox) = test_state();

        let response = create_subscription(
            &state,
            "name=Carlos+Augusto+G+Arruda&cpf=12345678901&email=x%40example.com&phone=31-996840810",
        );

        // 詳細ページへの302リダイレクト
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/subscriptions/1"
        );

        // レコードが1件だけ作成される
        assert_eq!(record_count(&state), 1);

        // 確認メールが1通だけ送信される
        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Confirmação de inscrição");
        assert_eq!(sent[0].from, "x@example.com");
        assert_eq!(
            sent[0].to,
            vec!["x@example.com".to_string(), "x@example.com".to_string()]
        );
        for expected in [
            "Carlos Augusto G Arruda",
            "12345678901",
            "x@example.com",
            "31-996840810",
        ] {
            assert!(sent[0].body.contains(expected), "{expected} が本文にありません");
        }
    }

    #[test]
    fn test_post_empty_redisplays_form_with_errors() {
        let (state, outbox) = test_state();

        let response = create_subscription(&state, "");

        // リダイレクトせず、エラー付きフォームを再表示する
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.body();
        assert!(body.contains("<form"));
        assert!(body.contains("<ul class=\"errorlist nonfield\">"));
        assert!(body.contains("Campo obrigatório"));

        // レコードは作成されず、メールも送信されない
        assert_eq!(record_count(&state), 0);
        assert!(outbox.sent().is_empty());
    }

    #[test]
    fn test_post_invalid_cpf_redisplays_form() {
        let (state, _outbox) = test_state();

        let response = create_subscription(&state, "name=Carlos&cpf=123");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().contains("CPF deve conter 11 digitos"));
        assert_eq!(record_count(&state), 0);
    }

    #[test]
    fn test_detail_renders_existing_record() {
        let (state, _outbox) = test_state();

        {
            let db = state.db.lock().unwrap();
            repository::create(
                &db,
                &NewSubscription {
                    name: "Carlos Arruda".to_string(),
                    cpf: "05620921611".to_string(),
                    email: "caugustogarruda@gmail.com".to_string(),
                    phone: "31-996840810".to_string(),
                },
            )
            .unwrap();
        }

        let response = subscription_detail(&state, "1");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.body();
        for expected in [
            "Carlos Arruda",
            "05620921611",
            "caugustogarruda@gmail.com",
            "31-996840810",
        ] {
            assert!(body.contains(expected), "{expected} がありません");
        }
    }

    #[test]
    fn test_mail_send_does_not_block_other_requests() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();

        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let state = AppState {
            db: Mutex::new(conn),
            mailer: Arc::new(BlockingMailer {
                entered: Mutex::new(entered_tx),
                release: Mutex::new(release_rx),
            }),
        };

        std::thread::scope(|scope| {
            let post = scope.spawn(|| {
                create_subscription(
                    &state,
                    "name=Carlos+Arruda&cpf=12345678901&email=x%40example.com",
                )
            });

            // メール送信が始まるまで待つ
            entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

            // 送信がブロックされていても、他のリクエストは処理できる
            let response = subscription_detail(&state, "999");
            assert_eq!(response.status(), StatusCode::NOT_FOUND);

            release_tx.send(()).unwrap();
            let response = post.join().unwrap();
            assert_eq!(response.status(), StatusCode::FOUND);
        });
    }

    #[test]
    fn test_detail_not_found() {
        let (state, _outbox) = test_state();

        let response = subscription_detail(&state, "0");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = subscription_detail(&state, "42");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // 数値でないIDも404
        let response = subscription_detail(&state, "abc");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
