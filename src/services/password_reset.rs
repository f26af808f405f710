use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::UserRepository;
use crate::services::{EmailService, auth::hash_password, token};

/// リセットトークンの有効期間（固定。リクエスト単位での変更は不可）
const RESET_TOKEN_TTL: Duration = Duration::seconds(3600);

/// パスワードリセットサービス
///
/// トークンのライフサイクル（発行・検証・消費）を管理する。
/// アカウント毎の未消費トークンは常に高々1つで、再発行は前のトークンを
/// 上書きし、消費は即座にクリアする。
#[derive(Clone)]
pub struct PasswordResetService {
    user_repo: UserRepository,
    email_service: EmailService,
    config: Arc<Config>,
}

impl PasswordResetService {
    /// 新しい PasswordResetService を作成
    pub fn new(
        user_repo: UserRepository,
        email_service: EmailService,
        config: Arc<Config>,
    ) -> Self {
        Self {
            user_repo,
            email_service,
            config,
        }
    }

    /// パスワードリセットをリクエスト（トークン発行＋メール送信）
    ///
    /// # Security
    /// - ユーザー不在時は副作用なしで `AccountNotFound` を返す。
    ///   成功時と同一のレスポンスに変換するのはハンドラー側の責務
    /// - トークン（平文）はログに出力しない
    ///
    /// # Errors
    /// - `AccountNotFound`: 該当ユーザーなし
    /// - `EmailDispatch`: 保存後の送信失敗。保存済みトークンはロールバック
    ///   しない（未達の有効トークンが残るだけで、再リクエストで上書きされる）
    pub async fn request_reset(&self, email: &str) -> Result<(), AppError> {
        tracing::info!(email = %email, "パスワードリセットリクエスト");

        let user = self.user_repo.find_by_email(email).await?;

        let Some(user) = user else {
            tracing::info!(email = %email, "パスワードリセット: ユーザー不在");
            return Err(AppError::AccountNotFound);
        };

        // 平文トークンを生成し、ハッシュだけをDBに保存
        let raw_token = token::generate();
        let token_hash = token::fingerprint(&raw_token);
        let expires_at = reset_expiry(OffsetDateTime::now_utc());

        // 既存の未消費トークンがあれば上書き（古いリンクは無効になる）
        self.user_repo
            .set_reset_token(user.id, &token_hash, expires_at)
            .await?;

        // 保存コミット後に送信
        let reset_url = reset_link(self.config.client_url(), &raw_token);
        self.email_service
            .send_password_reset_email(&user.email, &reset_url)
            .await?;

        tracing::info!(user_id = %user.id, "パスワードリセットメール送信完了");

        Ok(())
    }

    /// トークンを検証（読み取り専用）
    ///
    /// リセットフォーム表示前の事前チェック用。状態を一切変更しないため
    /// 何度呼んでも安全。トークン不一致と期限切れは区別せず、どちらも
    /// `TokenInvalidOrExpired` を返す。
    pub async fn validate(&self, raw_token: &str) -> Result<Uuid, AppError> {
        let token_hash = token::fingerprint(raw_token);

        let user = self
            .user_repo
            .find_by_reset_fingerprint(&token_hash)
            .await?;

        match user {
            Some(user) if token_usable(user.reset_expires_at, OffsetDateTime::now_utc()) => {
                Ok(user.id)
            }
            Some(user) => {
                tracing::warn!(user_id = %user.id, "期限切れリセットトークン");
                Err(AppError::TokenInvalidOrExpired)
            }
            None => Err(AppError::TokenInvalidOrExpired),
        }
    }

    /// トークンを消費してパスワードを更新
    ///
    /// ハッシュ一致かつ期限内の場合のみ、新パスワードの保存とリセット状態の
    /// クリアを1文の条件付きUPDATEで行う（ワンタイム性の保証）。
    /// 同一トークンでの2回目の消費は条件に一致せず `TokenInvalidOrExpired`。
    ///
    /// # Security
    /// - トークン・新パスワードはログに出力しない
    /// - 平文パスワードは必ずargon2でハッシュ化してから保存
    pub async fn consume(&self, raw_token: &str, new_password: &str) -> Result<(), AppError> {
        let token_hash = token::fingerprint(raw_token);
        let new_password_hash = hash_password(new_password)?;

        let updated = self
            .user_repo
            .reset_password_by_fingerprint(
                &token_hash,
                &new_password_hash,
                OffsetDateTime::now_utc(),
            )
            .await?;

        match updated {
            Some(user_id) => {
                tracing::info!(user_id = %user_id, "パスワードリセット完了");
                Ok(())
            }
            None => Err(AppError::TokenInvalidOrExpired),
        }
    }
}

/// 発行時刻から有効期限を計算
fn reset_expiry(now: OffsetDateTime) -> OffsetDateTime {
    now + RESET_TOKEN_TTL
}

/// トークンが使用可能か（厳密に expires_at > now。境界ちょうどは期限切れ）
fn token_usable(expires_at: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    matches!(expires_at, Some(t) if t > now)
}

/// リセットリンクを構築
fn reset_link(base_url: &str, raw_token: &str) -> String {
    format!("{}/reset-password/{}", base_url, raw_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_exactly_one_hour() {
        let issued = OffsetDateTime::UNIX_EPOCH;
        assert_eq!(reset_expiry(issued) - issued, Duration::seconds(3600));
    }

    #[test]
    fn test_token_usable_before_expiry() {
        let issued = OffsetDateTime::UNIX_EPOCH;
        let expires_at = reset_expiry(issued);
        assert!(token_usable(
            Some(expires_at),
            issued + Duration::seconds(3599)
        ));
    }

    #[test]
    fn test_token_expired_at_exact_boundary() {
        // expires_at == now は期限切れ扱い（厳密比較）
        let issued = OffsetDateTime::UNIX_EPOCH;
        let expires_at = reset_expiry(issued);
        assert!(!token_usable(
            Some(expires_at),
            issued + Duration::seconds(3600)
        ));
    }

    #[test]
    fn test_token_expired_after_window() {
        let issued = OffsetDateTime::UNIX_EPOCH;
        let expires_at = reset_expiry(issued);
        assert!(!token_usable(
            Some(expires_at),
            issued + Duration::seconds(3601)
        ));
    }

    #[test]
    fn test_token_unusable_without_expiry() {
        // reset_expires_at が NULL のユーザーは常に使用不可
        assert!(!token_usable(None, OffsetDateTime::UNIX_EPOCH));
    }

    #[test]
    fn test_reset_link_format() {
        let url = reset_link("https://app.example.com", "abc123");
        assert_eq!(url, "https://app.example.com/reset-password/abc123");
    }
}
