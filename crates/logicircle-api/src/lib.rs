// logicircle-api: Async Rust client for the Logi Circle camera cloud

pub mod accessories;
pub mod auth;
pub mod client;
pub mod error;
pub mod image;
pub mod models;
pub mod transport;

pub use auth::SessionCookie;
pub use client::{CircleClient, DEFAULT_API_URL, SESSION_COOKIE};
pub use error::Error;
pub use image::ImagePayload;
pub use models::AccessoryRecord;
pub use transport::{TlsMode, TransportConfig};
