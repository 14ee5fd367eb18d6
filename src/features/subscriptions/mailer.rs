use super::models::NewSubscription;
use crate::shared::config::SmtpConfig;
use crate::shared::errors::{AppError, AppResult};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::sync::Mutex;

/// 確認メールの件名（固定）
pub const CONFIRMATION_SUBJECT: &str = "Confirmação de inscrição";

/// 送信する確認メール
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationEmail {
    /// 件名
    pub subject: String,
    /// 送信元アドレス
    pub from: String,
    /// 宛先アドレスのリスト
    pub to: Vec<String>,
    /// 本文
    pub body: String,
}

/// 申し込み内容から確認メールを組み立てる
///
/// 送信元は申し込み時に入力されたメールアドレス、宛先は同じアドレスを
/// 2回並べたリスト。
///
/// # 引数
/// * `dto` - バリデーション済みの申し込み内容
///
/// # 戻り値
/// 組み立てられた確認メール
pub fn build_confirmation(dto: &NewSubscription) -> ConfirmationEmail {
    let body = format!(
        "Olá, {name}!\n\n\
         Sua inscrição no evento foi registrada com sucesso.\n\n\
         Nome: {name}\n\
         CPF: {cpf}\n\
         Email: {email}\n\
         Telefone: {phone}\n",
        name = dto.name,
        cpf = dto.cpf,
        email = dto.email,
        phone = dto.phone,
    );

    ConfirmationEmail {
        subject: CONFIRMATION_SUBJECT.to_string(),
        from: dto.email.clone(),
        to: vec![dto.email.clone(), dto.email.clone()],
        body,
    }
}

/// メール送信の抽象化
///
/// 本番はSMTP送信、SMTP未設定時はログ出力のみ、テストでは
/// 送信箱への蓄積と、実装を差し替えられるようにする。
pub trait Mailer: Send + Sync {
    /// 確認メールを送信する
    ///
    /// # 引数
    /// * `email` - 送信する確認メール
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はエラー
    fn send(&self, email: &ConfirmationEmail) -> AppResult<()>;
}

/// SMTP経由でメールを送信するMailer実装
pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    /// SMTP設定からSmtpMailerを作成する
    ///
    /// # 引数
    /// * `config` - SMTP設定
    ///
    /// # 戻り値
    /// SmtpMailer、または接続設定が不正な場合はエラー
    pub fn from_config(config: &SmtpConfig) -> AppResult<Self> {
        let transport = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::mail(format!("SMTPリレーの設定に失敗: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        log::info!("SMTPメーラーを初期化しました: {}:{}", config.host, config.port);

        Ok(Self { transport })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, email: &ConfirmationEmail) -> AppResult<()> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|e| AppError::mail(format!("送信元アドレスが不正です: {e}")))?;

        let mut builder = Message::builder().from(from).subject(email.subject.clone());

        for recipient in &email.to {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| AppError::mail(format!("宛先アドレスが不正です: {e}")))?;
            builder = builder.to(to);
        }

        let message = builder
            .body(email.body.clone())
            .map_err(|e| AppError::mail(format!("メールの組み立てに失敗: {e}")))?;

        self.transport
            .send(&message)
            .map_err(|e| AppError::mail(format!("SMTP送信に失敗: {e}")))?;

        log::info!("確認メールを送信しました: subject={}", email.subject);

        Ok(())
    }
}

/// 送信せずログ出力のみ行うMailer実装（SMTP未設定時のフォールバック）
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &ConfirmationEmail) -> AppResult<()> {
        log::info!(
            "確認メール（ログ出力のみ）: subject={}, from={}, to={:?}",
            email.subject,
            email.from,
            email.to
        );
        log::debug!("確認メール本文:\n{}", email.body);

        Ok(())
    }
}

/// 送信したメールをメモリ上に蓄積するMailer実装（テスト用送信箱）
#[derive(Default)]
pub struct OutboxMailer {
    outbox: Mutex<Vec<ConfirmationEmail>>,
}

impl OutboxMailer {
    /// 空の送信箱を作成する
    pub fn new() -> Self {
        Self::default()
    }

    /// 送信されたメールのコピーを取得する
    pub fn sent(&self) -> Vec<ConfirmationEmail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

impl Mailer for OutboxMailer {
    fn send(&self, email: &ConfirmationEmail) -> AppResult<()> {
        self.outbox
            .lock()
            .map_err(|e| AppError::concurrency(format!("送信箱ロックエラー: {e}")))?
            .push(email.clone());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dto() -> NewSubscription {
        NewSubscription {
            name: "Carlos Augusto G Arruda".to_string(),
            cpf: "12345678901".to_string(),
            email: "x@example.com".to_string(),
            phone: "31-996840810".to_string(),
        }
    }

    #[test]
    fn test_build_confirmation_subject_is_fixed() {
        let email = build_confirmation(&sample_dto());
        assert_eq!(email.subject, "Confirmação de inscrição");
    }

    #[test]
    fn test_build_confirmation_sender_and_recipients() {
        let email = build_confirmation(&sample_dto());

        // 送信元は入力されたメールアドレス
        assert_eq!(email.from, "x@example.com");

        // 宛先は同じアドレスが2回
        assert_eq!(
            email.to,
            vec!["x@example.com".to_string(), "x@example.com".to_string()]
        );
    }

    #[test]
    fn test_build_confirmation_body_contains_all_fields() {
        let email = build_confirmation(&sample_dto());

        assert!(email.body.contains("Carlos Augusto G Arruda"));
        assert!(email.body.contains("12345678901"));
        assert!(email.body.contains("x@example.com"));
        assert!(email.body.contains("31-996840810"));
    }

    #[test]
    fn test_outbox_mailer_captures_sent_emails() {
        let mailer = OutboxMailer::new();
        assert!(mailer.sent().is_empty());

        let email = build_confirmation(&sample_dto());
        mailer.send(&email).unwrap();
        mailer.send(&email).unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], email);
    }

    #[test]
    fn test_log_mailer_always_succeeds() {
        let email = build_confirmation(&sample_dto());
        assert!(LogMailer.send(&email).is_ok());
    }
}
