pub mod authentication;
pub mod forms;
pub mod session;
pub mod user;

pub use authentication::*;
pub use session::*;
pub use user::*;
