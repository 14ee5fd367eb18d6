/// リクエストの振り分け
pub mod router;

use crate::shared::config::ServerConfig;
use crate::shared::errors::{AppError, AppResult};
use crate::AppState;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpStream;

/// HTTPサーバーを開始し、接続を処理し続ける
///
/// 接続ごとにタスクを起動し、http1で処理する。
///
/// # 引数
/// * `config` - サーバー設定
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// リスナーが停止した場合はOk(())、バインド失敗時はエラー
pub async fn run(config: ServerConfig, state: Arc<AppState>) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .map_err(|e| {
            AppError::configuration(format!(
                "アドレス {} のバインドに失敗: {e}",
                config.bind_address()
            ))
        })?;

    log::info!(
        "HTTPサーバーを開始しました: http://{}",
        config.bind_address()
    );

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state).await {
                        log::error!("接続処理エラー: {e}");
                    }
                });
            }
            Err(e) => {
                log::error!("接続受け入れエラー: {e}");
                break;
            }
        }
    }

    Ok(())
}

/// TCP接続を処理する
async fn handle_connection(
    stream: TcpStream,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req| handle_request(req, Arc::clone(&state)));

    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
        log::error!("HTTP接続処理エラー: {err}");
    }

    Ok(())
}

/// HTTPリクエストを処理する
///
/// ボディを文字列に読み込んだうえでルーターに委譲する。
async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<String>, Infallible> {
    let (parts, body) = req.into_parts();

    log::debug!("リクエストを受信: {} {}", parts.method, parts.uri);

    let body = match body.collect().await {
        Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
        Err(e) => {
            log::error!("リクエストボディの読み込みに失敗: {e}");
            String::new()
        }
    };

    let query = parts.uri.query().unwrap_or("");

    Ok(router::route(
        &parts.method,
        parts.uri.path(),
        query,
        &body,
        &state,
    ))
}
