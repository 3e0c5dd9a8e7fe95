pub mod backoff;
pub mod client;
pub mod push;

pub use backoff::Backoff;
pub use client::ApiClient;
pub use push::{PushClient, PushFrame, PushSubscription};
pub use taskscope_api;
