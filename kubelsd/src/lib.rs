pub mod decode;
pub mod error;
pub mod format;
pub mod secret;

pub use error::{LsdError, Result};
pub use format::Format;
pub use secret::{transform, Document};
