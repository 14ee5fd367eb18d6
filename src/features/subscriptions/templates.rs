use super::forms::{FieldKind, SubscriptionForm, FIELDS};
use super::models::Subscription;

/// HTML特殊文字をエスケープする
///
/// # 引数
/// * `value` - エスケープ対象の文字列
///
/// # 戻り値
/// エスケープ済みの文字列
pub fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// ページの共通レイアウトを組み立てる
fn render_page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-br">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Eventex</title>
</head>
<body>
{content}
</body>
</html>"#
    )
}

/// エラーメッセージのリストをerrorlist形式で組み立てる
fn render_errorlist(messages: &[String], extra_class: &str) -> String {
    if messages.is_empty() {
        return String::new();
    }

    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", html_escape(m)))
        .collect();

    let class = if extra_class.is_empty() {
        "errorlist".to_string()
    } else {
        format!("errorlist {extra_class}")
    };

    format!("<ul class=\"{class}\">{items}</ul>\n")
}

/// 申し込みフォームページを組み立てる
///
/// 項目定義（FIELDS）の順に入力欄を描画し、送信値の再表示と
/// 項目別エラー・非フィールドエラーの表示を行う。
///
/// # 引数
/// * `form` - 表示するフォーム（エラーと送信値を保持）
///
/// # 戻り値
/// フォームページのHTML
pub fn render_form_page(form: &SubscriptionForm) -> String {
    let mut content = String::from("<h1>Inscrição</h1>\n");

    // 非フィールドエラー
    content.push_str(&render_errorlist(&form.non_field_errors, "nonfield"));

    content.push_str("<form method=\"post\" action=\"/subscriptions/new\">\n");

    for field in &FIELDS {
        let input_type = match field.kind {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
        };

        // 項目別エラー
        content.push_str(&render_errorlist(form.errors_for(field.name), ""));

        content.push_str(&format!(
            "<p><label for=\"id_{name}\">{label}</label> \
             <input type=\"{input_type}\" name=\"{name}\" id=\"id_{name}\" value=\"{value}\"></p>\n",
            name = field.name,
            label = field.label,
            value = html_escape(form.value(field.name)),
        ));
    }

    content.push_str("<p><input type=\"submit\" value=\"Enviar inscrição\"></p>\n</form>");

    render_page("Inscrição", &content)
}

/// 申し込み詳細ページを組み立てる
///
/// # 引数
/// * `subscription` - 表示する申し込み
///
/// # 戻り値
/// 詳細ページのHTML
pub fn render_detail_page(subscription: &Subscription) -> String {
    let content = format!(
        "<h1>Inscrição realizada</h1>\n\
         <dl>\n\
         <dt>Nome</dt><dd>{name}</dd>\n\
         <dt>CPF</dt><dd>{cpf}</dd>\n\
         <dt>Email</dt><dd>{email}</dd>\n\
         <dt>Telefone</dt><dd>{phone}</dd>\n\
         </dl>",
        name = html_escape(&subscription.name),
        cpf = html_escape(&subscription.cpf),
        email = html_escape(&subscription.email),
        phone = html_escape(&subscription.phone),
    );

    render_page("Inscrição realizada", &content)
}

/// 404ページを組み立てる
pub fn render_not_found_page() -> String {
    render_page("Não encontrado", "<h1>Página não encontrada</h1>")
}

/// 500ページを組み立てる
///
/// # 引数
/// * `message` - 訪問者向けのエラーメッセージ
pub fn render_error_page(message: &str) -> String {
    let content = format!("<h1>Erro interno</h1>\n<p>{}</p>", html_escape(message));
    render_page("Erro interno", &content)
}
