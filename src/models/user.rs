use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// ユーザー
///
/// パスワードリセット状態はユーザー行に埋め込む（reset_token_hash /
/// reset_expires_at）。両フィールドは必ず揃って設定・クリアされ、
/// 未発行時はどちらも NULL。
///
/// reset_token_hash に保存するのはトークンのSHA256ハッシュのみ。
/// 平文トークンはメールで送信し、DBには保存しない。
#[derive(Debug, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub reset_token_hash: Option<String>,
    pub reset_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
