pub mod health;
pub mod password_reset;
pub mod register;

pub use health::health_check;
pub use password_reset::{forgot_password, reset_password, validate_reset_token};
pub use register::register;
