pub mod health;
pub use self::health::health;

pub mod login_code;
pub use self::login_code::{confirm_code, issue_code, poll_code};

pub mod session;
pub use self::session::{AuthError, Authenticator, RemoteAuthenticator, SESSION_HEADER};

pub mod types;
