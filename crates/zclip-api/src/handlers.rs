//! Request handlers.

pub mod chat;
pub mod health;
pub mod jobs;
pub mod styles;
pub mod uploads;

pub use chat::*;
pub use health::*;
pub use jobs::*;
pub use styles::*;
pub use uploads::*;
