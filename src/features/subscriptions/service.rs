use super::mailer::{self, Mailer};
use super::models::{NewSubscription, Subscription};
use super::repository;
use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::sync::Mutex;

/// 申し込みを登録し、確認メールを送信する
///
/// データベースロックは挿入の間だけ保持し、メール送信前に解放する。
/// SMTP送信は遅い場合があるため、送信中に他のリクエストの
/// データベースアクセスを妨げてはならない。
///
/// 保存とメール送信はアトミックではない。メール送信の失敗は
/// ログに記録するのみで、保存済みの申し込みはそのまま有効となる
/// （再送は行わない）。メールアドレス未入力の場合は送信をスキップする。
///
/// # 引数
/// * `db` - データベース接続（排他制御付き）
/// * `mailer` - メール送信の実装
/// * `dto` - バリデーション済みの申し込み内容
///
/// # 戻り値
/// 保存された申し込み、または保存失敗時はエラー
pub fn subscribe(
    db: &Mutex<Connection>,
    mailer: &dyn Mailer,
    dto: &NewSubscription,
) -> AppResult<Subscription> {
    // 挿入が終わった時点でロックを解放する
    let subscription = {
        let conn = db
            .lock()
            .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))?;
        repository::create(&conn, dto)?
    };

    log::info!(
        "申し込みを登録しました: id={}, name={}",
        subscription.id,
        subscription.name
    );

    if dto.email.is_empty() {
        log::warn!(
            "メールアドレス未入力のため確認メールをスキップします: id={}",
            subscription.id
        );
        return Ok(subscription);
    }

    let email = mailer::build_confirmation(dto);
    if let Err(e) = mailer.send(&email) {
        log::error!(
            "確認メールの送信に失敗しました: id={}, error={}",
            subscription.id,
            e.details()
        );
    }

    Ok(subscription)
}
