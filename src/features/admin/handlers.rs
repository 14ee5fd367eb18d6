use crate::features::subscriptions::handlers::{html_response, internal_error_response};
use crate::features::subscriptions::repository::{self, SubscriptionFilter};
use crate::features::subscriptions::templates::html_escape;
use crate::shared::errors::AppError;
use crate::AppState;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::America::Sao_Paulo;
use hyper::{Response, StatusCode};

/// 管理画面一覧の列見出し
const COLUMNS: [&str; 6] = [
    "nome",
    "email",
    "telefone",
    "criado em",
    "inscrito hoje?",
    "pago",
];

/// クエリ文字列から絞り込み条件を組み立てる
///
/// 対応パラメータ: `paid`（0/1）、`created`（YYYY-MM-DD）、`q`（自由テキスト）。
/// 不正な値は指定なしとして扱う。
///
/// # 引数
/// * `query` - URLのクエリ文字列
///
/// # 戻り値
/// 絞り込み条件
pub fn parse_filter(query: &str) -> SubscriptionFilter {
    let mut filter = SubscriptionFilter::default();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "paid" => {
                filter.paid = match value.as_ref() {
                    "1" | "true" => Some(true),
                    "0" | "false" => Some(false),
                    _ => None,
                }
            }
            "created" => {
                // YYYY-MM-DD形式のみ受け付ける
                if NaiveDate::parse_from_str(&value, "%Y-%m-%d").is_ok() {
                    filter.created = Some(value.into_owned());
                }
            }
            "q" => {
                let text = value.trim().to_string();
                if !text.is_empty() {
                    filter.query = Some(text);
                }
            }
            _ => {}
        }
    }

    filter
}

/// 申し込みが指定日に作成されたかどうかを判定する
///
/// # 引数
/// * `created_at` - RFC3339形式の作成日時
/// * `today` - 比較対象の日付（サンパウロ時間）
///
/// # 戻り値
/// 作成日が指定日と一致する場合はtrue（解析失敗時はfalse）
pub fn subscribed_on(created_at: &str, today: NaiveDate) -> bool {
    match DateTime::parse_from_rfc3339(created_at) {
        Ok(datetime) => datetime.with_timezone(&Sao_Paulo).date_naive() == today,
        Err(_) => false,
    }
}

/// GET /admin/subscriptions - 申し込み一覧を表示する
///
/// 読み取り専用の一覧。支払いフラグ・作成日での絞り込みと、
/// name/email/phone/created_atを対象とする自由テキスト検索に対応する。
///
/// # 引数
/// * `state` - アプリケーション状態
/// * `query` - URLのクエリ文字列
///
/// # 戻り値
/// 一覧ページ（200）
pub fn listing(state: &AppState, query: &str) -> Response<String> {
    let filter = parse_filter(query);

    let db = match state.db.lock() {
        Ok(db) => db,
        Err(e) => {
            log::error!("データベースロックエラー: {e}");
            return internal_error_response(&AppError::concurrency(format!(
                "データベースロックエラー: {e}"
            )));
        }
    };

    let subscriptions = match repository::search(&db, &filter) {
        Ok(subscriptions) => subscriptions,
        Err(e) => {
            log::error!("申し込み一覧の取得に失敗しました: {}", e.details());
            return internal_error_response(&e);
        }
    };

    let today = Utc::now().with_timezone(&Sao_Paulo).date_naive();
    html_response(StatusCode::OK, render_listing_page(&subscriptions, today))
}

/// 一覧ページのHTMLを組み立てる
fn render_listing_page(
    subscriptions: &[crate::features::subscriptions::models::Subscription],
    today: NaiveDate,
) -> String {
    let header: String = COLUMNS
        .iter()
        .map(|c| format!("<th>{c}</th>"))
        .collect();

    let rows: String = subscriptions
        .iter()
        .map(|s| {
            format!(
                "<tr><td>{name}</td><td>{email}</td><td>{phone}</td>\
                 <td>{created_at}</td><td>{subscribed_today}</td><td>{paid}</td></tr>\n",
                name = html_escape(&s.name),
                email = html_escape(&s.email),
                phone = html_escape(&s.phone),
                created_at = html_escape(&s.created_at),
                subscribed_today = render_boolean(subscribed_on(&s.created_at, today)),
                paid = render_boolean(s.paid),
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-br">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Inscrições - Eventex</title>
</head>
<body>
<h1>Inscrições</h1>
<form method="get" action="/admin/subscriptions">
<input type="text" name="q" placeholder="Buscar">
<input type="submit" value="Buscar">
</form>
<table>
<thead><tr>{header}</tr></thead>
<tbody>
{rows}</tbody>
</table>
<p>Total: {total}</p>
</body>
</html>"#,
        total = subscriptions.len(),
    )
}

/// 真偽値の表示（sim/não）
fn render_boolean(value: bool) -> &'static str {
    if value {
        "sim"
    } else {
        "não"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::subscriptions::mailer::{Mailer, OutboxMailer};
    use crate::features::subscriptions::models::NewSubscription;
    use crate::features::subscriptions::repository::create;
    use crate::shared::database::create_tables;
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    fn test_state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let mailer: Arc<dyn Mailer> = Arc::new(OutboxMailer::new());

        AppState {
            db: Mutex::new(conn),
            mailer,
        }
    }

    fn insert_sample(state: &AppState, name: &str, email: &str) {
        let db = state.db.lock().unwrap();
        create(
            &db,
            &NewSubscription {
                name: name.to_string(),
                cpf: "12345678901".to_string(),
                email: email.to_string(),
                phone: "31-996840810".to_string(),
            },
        )
        .unwrap();
    }

    #[test]
    fn test_parse_filter() {
        let filter = parse_filter("paid=1&created=2025-01-15&q=Carlos");
        assert_eq!(filter.paid, Some(true));
        assert_eq!(filter.created, Some("2025-01-15".to_string()));
        assert_eq!(filter.query, Some("Carlos".to_string()));

        let filter = parse_filter("paid=0");
        assert_eq!(filter.paid, Some(false));
        assert!(filter.created.is_none());
        assert!(filter.query.is_none());

        // 不正な値は指定なしとして扱う
        let filter = parse_filter("paid=x&created=15-01-2025&q=++");
        assert!(filter.paid.is_none());
        assert!(filter.created.is_none());
        assert!(filter.query.is_none());
    }

    #[test]
    fn test_subscribed_on() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        assert!(subscribed_on("2025-01-15T09:30:00-03:00", today));
        assert!(!subscribed_on("2025-01-14T09:30:00-03:00", today));

        // 解析できない日時はfalse
        assert!(!subscribed_on("invalido", today));
    }

    #[test]
    fn test_subscribed_on_respects_timezone() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        // UTCの深夜はサンパウロではまだ前日
        assert!(!subscribed_on("2025-01-15T01:00:00+00:00", today));
        assert!(subscribed_on("2025-01-15T01:00:00+00:00",
            NaiveDate::from_ymd_opt(2025, 1, 14).unwrap()));
    }

    #[test]
    fn test_listing_renders_columns_and_rows() {
        let state = test_state();
        insert_sample(&state, "Carlos Arruda", "caugustogarruda@gmail.com");

        let response = listing(&state, "");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.body();

        // 列見出し（支払い列と当日判定列を含む）
        for column in COLUMNS {
            assert!(body.contains(column), "列 {column} がありません");
        }

        // 行の内容
        assert!(body.contains("Carlos Arruda"));
        assert!(body.contains("caugustogarruda@gmail.com"));
        assert!(body.contains("31-996840810"));

        // 作成直後なので「inscrito hoje?」はsim、pagoはnão
        assert!(body.contains("<td>sim</td>"));
        assert!(body.contains("<td>não</td>"));
    }

    #[test]
    fn test_listing_applies_search_filter() {
        let state = test_state();
        insert_sample(&state, "Carlos Arruda", "caugustogarruda@gmail.com");
        insert_sample(&state, "Ana Silva", "ana@example.com");

        let response = listing(&state, "q=Carlos");
        let body = response.body();

        assert!(body.contains("Carlos Arruda"));
        assert!(!body.contains("Ana Silva"));
        assert!(body.contains("Total: 1"));
    }

    #[test]
    fn test_listing_applies_paid_filter() {
        let state = test_state();
        insert_sample(&state, "Carlos Arruda", "caugustogarruda@gmail.com");

        // 支払い済みの申し込みは存在しない
        let response = listing(&state, "paid=1");
        assert!(response.body().contains("Total: 0"));

        let response = listing(&state, "paid=0");
        assert!(response.body().contains("Total: 1"));
    }
}
