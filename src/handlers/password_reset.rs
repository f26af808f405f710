use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// forgot-password の固定レスポンス文言
///
/// # Security
/// 登録済み・未登録どちらのメールアドレスでも、ステータスもボディも
/// バイト単位で同一のレスポンスを返す（存在有無の漏洩防止）
const FORGOT_PASSWORD_MESSAGE: &str =
    "登録されているメールアドレスであれば、パスワードリセット用のリンクを送信しました";

// === リセットリクエスト ===

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: &'static str,
}

/// POST /api/forgot-password
///
/// # Security
/// ユーザー不在（`AccountNotFound`）は成功と同一の200に変換する。
/// 保存・送信の失敗のみ500になる（内部詳細はボディに出さない）。
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    // バリデーション
    validate_email(&request.email)?;

    match state.password_reset.request_reset(&request.email).await {
        Ok(()) | Err(AppError::AccountNotFound) => Ok(Json(ForgotPasswordResponse {
            message: FORGOT_PASSWORD_MESSAGE,
        })),
        Err(e) => Err(e),
    }
}

// === トークン事前チェック ===

#[derive(Debug, Serialize)]
pub struct ValidateTokenResponse {
    pub message: &'static str,
}

/// GET /api/reset-password/{token}
///
/// リセットフォーム表示前の事前チェック。読み取り専用で何度でも呼べる。
/// トークンを持っている時点で正規のメール経由なので、有効性の開示は許容する。
pub async fn validate_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ValidateTokenResponse>, AppError> {
    state.password_reset.validate(&token).await?;

    Ok(Json(ValidateTokenResponse {
        message: "トークンは有効です",
    }))
}

// === パスワードリセット実行 ===

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub message: &'static str,
}

/// POST /api/reset-password/{token}
///
/// # Security
/// - token, new_password はログに出力しない
/// - トークン不一致と期限切れは同一の400（区別して返さない）
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AppError> {
    // バリデーション
    validate_reset_password_request(&token, &request)?;

    state
        .password_reset
        .consume(&token, &request.new_password)
        .await?;

    Ok(Json(ResetPasswordResponse {
        message: "パスワードが更新されました",
    }))
}

/// メールアドレスのバリデーション
fn validate_email(email: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    Ok(())
}

/// リセットパスワードリクエストのバリデーション
fn validate_reset_password_request(
    token: &str,
    request: &ResetPasswordRequest,
) -> Result<(), AppError> {
    if token.trim().is_empty() {
        return Err(AppError::Validation("トークンは必須です".to_string()));
    }
    if request.new_password.len() < 8 {
        return Err(AppError::Validation(
            "パスワードは8文字以上で入力してください".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_email() {
        let result = validate_email("");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        let result = validate_email("invalid-email");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_valid_email() {
        let result = validate_email("test@example.com");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_empty_token() {
        let request = ResetPasswordRequest {
            new_password: "password123".to_string(),
        };
        let result = validate_reset_password_request("", &request);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_short_password() {
        let request = ResetPasswordRequest {
            new_password: "short".to_string(),
        };
        let result = validate_reset_password_request("valid-token", &request);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_valid_reset_request() {
        let request = ResetPasswordRequest {
            new_password: "password123".to_string(),
        };
        let result = validate_reset_password_request("valid-token", &request);
        assert!(result.is_ok());
    }
}
