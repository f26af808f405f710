use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;

#[cfg(feature = "email")]
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::Mailbox,
    transport::smtp::authentication::Credentials,
};
#[cfg(feature = "email")]
use secrecy::ExposeSecret;

/// メール送信サービス
///
/// SMTPトランスポートはプロセス起動時に一度だけ構築し、
/// 全リクエストで共有する（リクエスト毎の構築はしない）。
/// email機能無効時、またはSMTP未設定時はログ出力のみの開発モードで動作する。
#[derive(Clone)]
pub struct EmailService {
    #[cfg_attr(not(feature = "email"), allow(dead_code))]
    config: Arc<Config>,
    #[cfg(feature = "email")]
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl EmailService {
    /// 新しい EmailService を作成
    pub fn new(config: Arc<Config>) -> Self {
        #[cfg(feature = "email")]
        let mailer = Self::build_mailer(&config);

        Self {
            config,
            #[cfg(feature = "email")]
            mailer,
        }
    }

    #[cfg(feature = "email")]
    fn build_mailer(config: &Config) -> Option<AsyncSmtpTransport<Tokio1Executor>> {
        let host = config.smtp_host.as_ref()?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(
                username.expose_secret().clone(),
                password.expose_secret().clone(),
            ));
        }

        tracing::info!(host = %host, port = %config.smtp_port, "SMTPトランスポート初期化完了");
        Some(builder.build())
    }

    /// パスワードリセットメールを送信
    ///
    /// # Security
    /// - reset_url には平文トークンが含まれるため本文以外には出さない
    /// - 送信失敗はそのまま返す。アカウント存在有無の隠蔽はハンドラー側の責務
    pub async fn send_password_reset_email(
        &self,
        to: &str,
        reset_url: &str,
    ) -> Result<(), AppError> {
        #[cfg(feature = "email")]
        if let Some(mailer) = &self.mailer {
            return self.send_via_smtp(mailer, to, reset_url).await;
        }

        // 開発モード: メール送信せずログ出力のみ
        tracing::info!(to = %to, "パスワードリセットメール送信（開発モード）");
        tracing::info!("リセットURL: {}", reset_url);

        Ok(())
    }

    #[cfg(feature = "email")]
    async fn send_via_smtp(
        &self,
        mailer: &AsyncSmtpTransport<Tokio1Executor>,
        to: &str,
        reset_url: &str,
    ) -> Result<(), AppError> {
        let from: Mailbox = self
            .config
            .smtp_from_address
            .as_deref()
            .unwrap_or("no-reply@localhost")
            .parse()
            .map_err(|_| AppError::EmailDispatch("invalid FROM address".to_string()))?;
        let to: Mailbox = to
            .parse()
            .map_err(|_| AppError::EmailDispatch("invalid TO address".to_string()))?;

        let body = format!(
            "パスワードリセットのリクエストを受け付けました。\n\n\
             1時間以内に以下のリンクからパスワードを再設定してください:\n\n\
             {reset_url}\n\n\
             心当たりがない場合はこのメールを無視してください。\
             パスワードは変更されません。\n"
        );

        let message = Message::builder()
            .to(to)
            .from(from)
            .subject("パスワードリセットのご案内")
            .body(body)
            .map_err(|e| AppError::EmailDispatch(e.to_string()))?;

        mailer
            .send(message)
            .await
            .map_err(|e| AppError::EmailDispatch(e.to_string()))?;

        Ok(())
    }
}
