use super::models::{NewSubscription, Subscription};
use crate::shared::errors::{AppError, AppResult};
use chrono::Utc;
use chrono_tz::America::Sao_Paulo;
use rusqlite::{params, Connection, Row};

/// 管理画面一覧の絞り込み条件
#[derive(Debug, Default, Clone)]
pub struct SubscriptionFilter {
    /// 支払いフラグでの絞り込み
    pub paid: Option<bool>,
    /// 作成日（YYYY-MM-DD）での絞り込み
    pub created: Option<String>,
    /// name/email/phone/created_atを対象とする自由テキスト検索
    pub query: Option<String>,
}

/// 申し込みを作成する
///
/// created_atは作成時に一度だけ設定され、以後変更されない。
/// paidはデフォルトの未払い（0）で作成される。
///
/// # 引数
/// * `conn` - データベース接続
/// * `dto` - 申し込み作成用DTO
///
/// # 戻り値
/// 作成された申し込み、または失敗時はエラー
pub fn create(conn: &Connection, dto: &NewSubscription) -> AppResult<Subscription> {
    // サンパウロ時間で現在時刻を取得
    let now = Utc::now().with_timezone(&Sao_Paulo).to_rfc3339();

    conn.execute(
        "INSERT INTO subscriptions (name, cpf, email, phone, created_at, paid)
         VALUES (?1, ?2, ?3, ?4, ?5, 0)",
        params![dto.name, dto.cpf, dto.email, dto.phone, now],
    )?;

    let id = conn.last_insert_rowid();
    find_by_id(conn, id)
}

/// IDで申し込みを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - 申し込みID
///
/// # 戻り値
/// 申し込み、または失敗時はエラー
pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Subscription> {
    conn.query_row(
        "SELECT id, name, cpf, email, phone, created_at, paid
         FROM subscriptions WHERE id = ?1",
        params![id],
        row_to_subscription,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            AppError::not_found("Inscrição não encontrada")
        }
        _ => AppError::Database(e),
    })
}

/// 申し込み一覧を取得する（作成日時の降順）
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 申し込みのリスト、または失敗時はエラー
pub fn find_all(conn: &Connection) -> AppResult<Vec<Subscription>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, cpf, email, phone, created_at, paid
         FROM subscriptions ORDER BY created_at DESC, id DESC",
    )?;

    let subscriptions = stmt.query_map([], row_to_subscription)?;

    subscriptions
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::Database)
}

/// 申し込み件数を取得する
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 申し込み件数、または失敗時はエラー
pub fn count(conn: &Connection) -> AppResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM subscriptions", [], |row| row.get(0))
        .map_err(AppError::Database)
}

/// 絞り込み条件付きで申し込み一覧を取得する（管理画面用）
///
/// # 引数
/// * `conn` - データベース接続
/// * `filter` - 絞り込み条件
///
/// # 戻り値
/// 申し込みのリスト、または失敗時はエラー
pub fn search(conn: &Connection, filter: &SubscriptionFilter) -> AppResult<Vec<Subscription>> {
    let mut query = String::from(
        "SELECT id, name, cpf, email, phone, created_at, paid
         FROM subscriptions WHERE 1=1",
    );

    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    // 支払いフラグフィルター
    if let Some(paid) = filter.paid {
        query.push_str(" AND paid = ?");
        params.push(Box::new(i64::from(paid)));
    }

    // 作成日フィルター（RFC3339先頭の日付部分との前方一致）
    if let Some(created) = &filter.created {
        query.push_str(" AND created_at LIKE ?");
        params.push(Box::new(format!("{created}%")));
    }

    // 自由テキスト検索（%や_はリテラルとして扱う）
    if let Some(text) = &filter.query {
        query.push_str(
            " AND (name LIKE ? ESCAPE '\\' OR email LIKE ? ESCAPE '\\' \
             OR phone LIKE ? ESCAPE '\\' OR created_at LIKE ? ESCAPE '\\')",
        );
        let pattern = format!("%{}%", escape_like(text));
        for _ in 0..4 {
            params.push(Box::new(pattern.clone()));
        }
    }

    query.push_str(" ORDER BY created_at DESC, id DESC");

    let mut stmt = conn.prepare(&query)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let subscriptions = stmt.query_map(param_refs.as_slice(), row_to_subscription)?;

    subscriptions
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::Database)
}

/// LIKEパターンのメタ文字をエスケープする
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// 行を申し込みモデルに変換する
fn row_to_subscription(row: &Row<'_>) -> Result<Subscription, rusqlite::Error> {
    Ok(Subscription {
        id: row.get(0)?,
        name: row.get(1)?,
        cpf: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        created_at: row.get(5)?,
        paid: row.get::<_, i64>(6)? != 0,
    })
}
