use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// メールアドレスでユーザーを検索
    ///
    /// # Note
    /// DB セットアップ後は `query_as!` マクロに変更してコンパイル時SQL検証を有効にすること
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, reset_token_hash, reset_expires_at,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// 新しいユーザーを作成
    ///
    /// # Errors
    /// - UNIQUE制約違反時: `sqlx::Error::Database` (constraint = "users_email_key")
    ///   呼び出し側で `AppError::EmailAlreadyExists` に変換すること
    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, reset_token_hash, reset_expires_at,
                      created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
    }

    /// リセットトークンのハッシュでユーザーを検索
    ///
    /// # Note
    /// 有効期限の検証は呼び出し側で行う。このクエリは読み取り専用で、
    /// 何度呼んでも状態を変更しない。
    pub async fn find_by_reset_fingerprint(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, reset_token_hash, reset_expires_at,
                   created_at, updated_at
            FROM users
            WHERE reset_token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// リセットトークンのハッシュと有効期限を設定
    ///
    /// 既存の未消費トークンがあれば上書きされる（古いリンクは無効になる）。
    /// 両カラムを1文で更新するため、片方だけが設定された状態は発生しない。
    pub async fn set_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token_hash = $2, reset_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 有効なリセットトークンを消費してパスワードを更新
    ///
    /// ハッシュ一致かつ期限内（厳密に expires_at > now）の行だけを
    /// 1文の条件付きUPDATEで更新し、リセット状態をクリアする。
    /// 行単位の更新なので、同一トークンに対する2回目の消費は
    /// 条件に一致せず `None` になる。
    ///
    /// # Returns
    /// 更新されたユーザーのID。一致する行がなければ `None`
    /// （トークン不一致か期限切れかは区別しない）。
    ///
    /// # Note
    /// new_password_hash はログに出力しないこと
    pub async fn reset_password_by_fingerprint(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE users
            SET password_hash = $2,
                reset_token_hash = NULL,
                reset_expires_at = NULL,
                updated_at = NOW()
            WHERE reset_token_hash = $1 AND reset_expires_at > $3
            RETURNING id
            "#,
        )
        .bind(token_hash)
        .bind(new_password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id,)| id))
    }
}
