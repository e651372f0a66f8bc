pub mod account;
pub mod notifier;
pub mod password;
pub mod reset;

pub use account::AccountService;
pub use notifier::{notifier_for, LogOtpNotifier, OtpNotifier, WebhookOtpNotifier};
pub use password::PasswordService;
pub use reset::PasswordResetService;
