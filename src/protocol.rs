pub mod codec;
pub mod error_code;
pub mod meeting;
pub mod message;
pub mod msg_type;
pub mod protocol;

pub use protocol::{ws_handler, AppState, SemaphoreDelay};
