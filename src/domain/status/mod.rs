pub mod channel;

pub use channel::{StatusChannel, StatusEvent};
