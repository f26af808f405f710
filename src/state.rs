use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::repositories::UserRepository;
use crate::services::{EmailService, PasswordResetService};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
/// 各サービスはプロセス起動時に一度だけ構築し、リクエスト毎には作らない。
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL コネクションプール
    pub db_pool: PgPool,
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// ユーザーリポジトリ
    pub user_repo: UserRepository,
    /// パスワードリセットのライフサイクル管理
    pub password_reset: PasswordResetService,
}

impl AppState {
    /// 新しい AppState を作成
    pub fn new(db_pool: PgPool, config: Config) -> Self {
        let config = Arc::new(config);
        let user_repo = UserRepository::new(db_pool.clone());
        let email_service = EmailService::new(config.clone());
        let password_reset =
            PasswordResetService::new(user_repo.clone(), email_service, config.clone());

        Self {
            db_pool,
            config,
            user_repo,
            password_reset,
        }
    }
}
