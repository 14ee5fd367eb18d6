use serde::{Deserialize, Serialize};

/// 申し込みデータモデル
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Subscription {
    pub id: i64,
    pub name: String,       // 参加者名（各単語の先頭を大文字に正規化済み）
    pub cpf: String,        // 11桁のASCII数字
    pub email: String,      // 任意入力（未入力は空文字列）
    pub phone: String,      // 任意入力（未入力は空文字列）
    pub created_at: String, // RFC3339形式（America/Sao_Paulo）、作成時に一度だけ設定
    pub paid: bool,         // 支払いフラグ（デフォルトfalse、管理側のみ更新）
}

impl std::fmt::Display for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 申し込み作成用DTO（バリデーション済みのフォーム入力）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewSubscription {
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub phone: String,
}
