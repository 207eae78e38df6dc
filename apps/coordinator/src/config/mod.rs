pub mod session;

pub use session::{AckTimeoutPolicy, SessionConfig};
