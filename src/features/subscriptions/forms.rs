use super::models::NewSubscription;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// 必須項目未入力時のエラーメッセージ
pub const REQUIRED_MESSAGE: &str = "Campo obrigatório";

/// 全項目未入力時の非フィールドエラーメッセージ
pub const EMPTY_SUBMISSION_MESSAGE: &str = "Nenhum dado foi enviado";

/// メールアドレス形式エラーメッセージ
pub const INVALID_EMAIL_MESSAGE: &str = "Informe um endereço de email válido";

/// メールアドレスの形式チェック用正規表現
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// フォーム項目の入力種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// テキスト入力
    Text,
    /// メールアドレス入力
    Email,
}

/// フォーム項目の定義
///
/// 項目の並び順・必須/任意・バリデータを明示的に宣言する。
pub struct FieldSpec {
    /// 項目名（POSTパラメータ名）
    pub name: &'static str,
    /// 表示ラベル（ポルトガル語）
    pub label: &'static str,
    /// 入力種別
    pub kind: FieldKind,
    /// 必須項目かどうか
    pub required: bool,
    /// 項目固有のバリデータ
    pub validator: Option<fn(&str) -> Result<(), String>>,
}

/// 申し込みフォームの項目定義（表示順）
pub const FIELDS: [FieldSpec; 4] = [
    FieldSpec {
        name: "name",
        label: "Nome",
        kind: FieldKind::Text,
        required: true,
        validator: None,
    },
    FieldSpec {
        name: "cpf",
        label: "CPF",
        kind: FieldKind::Text,
        required: true,
        validator: Some(validate_cpf),
    },
    FieldSpec {
        name: "email",
        label: "Email",
        kind: FieldKind::Email,
        required: false,
        validator: None,
    },
    FieldSpec {
        name: "phone",
        label: "Telefone",
        kind: FieldKind::Text,
        required: false,
        validator: None,
    },
];

/// CPF文字列の形式を検証する
///
/// チェックサムは検証せず、形式（ASCII数字のみ・11桁）のみを確認する。
///
/// # 引数
/// * `value` - 検証対象の文字列
///
/// # 戻り値
/// 形式が正しい場合はOk(())、不正な場合はエラーメッセージ
pub fn validate_cpf(value: &str) -> Result<(), String> {
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err("CPF deve conter apenas números".to_string());
    }

    if value.chars().count() != 11 {
        return Err("CPF deve conter 11 digitos".to_string());
    }

    Ok(())
}

/// メールアドレスの形式を検証する
///
/// # 引数
/// * `value` - 検証対象の文字列
///
/// # 戻り値
/// 形式が正しい場合はOk(())、不正な場合はエラーメッセージ
pub fn validate_email(value: &str) -> Result<(), String> {
    if EMAIL_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(INVALID_EMAIL_MESSAGE.to_string())
    }
}

/// 参加者名を正規化する
///
/// 空白で分割した各単語の先頭を大文字・残りを小文字にし、
/// 単一スペースで連結する。
///
/// # 引数
/// * `name` - 入力された参加者名
///
/// # 戻り値
/// 正規化された参加者名
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 単語の先頭を大文字に、残りを小文字にする
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// 申し込みフォーム
///
/// 送信された値と、バリデーションで発生した項目別エラー・
/// 非フィールドエラーを保持する。エラー発生時はこのままテンプレートに
/// 渡して再表示する。
#[derive(Debug, Default)]
pub struct SubscriptionForm {
    /// 送信された値（項目名 -> 値、前後の空白は除去済み）
    values: BTreeMap<String, String>,
    /// 項目別エラー（項目名 -> エラーメッセージのリスト）
    pub field_errors: BTreeMap<String, Vec<String>>,
    /// 特定の項目に帰属しないエラー
    pub non_field_errors: Vec<String>,
}

impl SubscriptionForm {
    /// 空のフォームを作成する（GET表示用）
    pub fn empty() -> Self {
        Self::default()
    }

    /// application/x-www-form-urlencoded形式のボディからフォームを作成する
    ///
    /// # 引数
    /// * `body` - リクエストボディ
    ///
    /// # 戻り値
    /// 送信値を保持したフォーム（バリデーションは未実施）
    pub fn from_body(body: &str) -> Self {
        let mut values = BTreeMap::new();

        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            values.insert(key.into_owned(), value.trim().to_string());
        }

        Self {
            values,
            field_errors: BTreeMap::new(),
            non_field_errors: Vec::new(),
        }
    }

    /// 項目の送信値を取得する（未送信は空文字列）
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    /// 項目のエラーメッセージを取得する
    pub fn errors_for(&self, name: &str) -> &[String] {
        self.field_errors
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// エラーが存在するかどうか
    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty() || !self.non_field_errors.is_empty()
    }

    /// 全項目のバリデーションを実行する
    ///
    /// 項目定義（FIELDS）の順に必須チェック・種別チェック・
    /// 項目固有バリデータを実行し、エラーを収集する。
    ///
    /// # 戻り値
    /// 全項目が有効な場合は正規化済みDTO、エラーがある場合はNone
    /// （エラー内容はフォーム自身に保持される）
    pub fn validate(&mut self) -> Option<NewSubscription> {
        self.field_errors.clear();
        self.non_field_errors.clear();

        for field in &FIELDS {
            let value = self.value(field.name).to_string();

            if value.is_empty() {
                if field.required {
                    self.add_field_error(field.name, REQUIRED_MESSAGE.to_string());
                }
                continue;
            }

            // 種別チェック（メールアドレス形式）
            if field.kind == FieldKind::Email {
                if let Err(message) = validate_email(&value) {
                    self.add_field_error(field.name, message);
                }
            }

            // 項目固有バリデータ
            if let Some(validator) = field.validator {
                if let Err(message) = validator(&value) {
                    self.add_field_error(field.name, message);
                }
            }
        }

        // 全項目が未入力の場合は非フィールドエラーを追加
        if FIELDS.iter().all(|field| self.value(field.name).is_empty()) {
            self.non_field_errors
                .push(EMPTY_SUBMISSION_MESSAGE.to_string());
        }

        if self.has_errors() {
            return None;
        }

        Some(NewSubscription {
            name: normalize_name(self.value("name")),
            cpf: self.value("cpf").to_string(),
            email: self.value("email").to_string(),
            phone: self.value("phone").to_string(),
        })
    }

    /// 項目別エラーを追加する
    fn add_field_error(&mut self, name: &str, message: String) {
        self.field_errors
            .entry(name.to_string())
            .or_default()
            .push(message);
    }
}
