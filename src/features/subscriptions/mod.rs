/// 申し込み機能モジュール
///
/// このモジュールは、イベント参加申し込みに関連するすべての機能を提供します：
/// - 申し込みフォームの表示とバリデーション（CPF形式チェック、名前の正規化）
/// - 申し込みの保存と詳細表示
/// - 確認メールの送信
pub mod forms;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod repository;
pub mod service;
pub mod templates;

// 公開インターフェース
pub use forms::{normalize_name, validate_cpf, validate_email, SubscriptionForm};

pub use handlers::{create_subscription, new_subscription_form, subscription_detail};

pub use mailer::{build_confirmation, ConfirmationEmail, LogMailer, Mailer, OutboxMailer, SmtpMailer};

pub use models::{NewSubscription, Subscription};

pub use repository::{count, create, find_all, find_by_id, search, SubscriptionFilter};

pub use service::subscribe;
