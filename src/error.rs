use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),

    #[error("このメールアドレスは既に使用されています")]
    EmailAlreadyExists,

    /// リセット要求先のユーザーが存在しない
    ///
    /// # Security
    /// forgot-password ハンドラーはこのエラーを握りつぶして
    /// 成功時と同一のレスポンスを返す（存在有無の漏洩防止）
    #[error("ユーザーが見つかりません")]
    AccountNotFound,

    /// トークン不一致と期限切れは外部から区別できない単一のエラー
    #[error("無効または期限切れのリンクです")]
    TokenInvalidOrExpired,

    #[error("メール送信エラー: {0}")]
    EmailDispatch(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                "このメールアドレスは既に使用されています".to_string(),
            ),
            Self::AccountNotFound => (
                StatusCode::BAD_REQUEST,
                "無効なリクエストです".to_string(), // 存在有無の漏洩防止
            ),
            Self::TokenInvalidOrExpired => (
                StatusCode::BAD_REQUEST,
                "無効または期限切れのリンクです".to_string(),
            ),
            Self::EmailDispatch(e) => {
                tracing::error!(error = %e, "メール送信エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
