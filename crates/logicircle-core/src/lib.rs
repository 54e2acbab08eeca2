//! Session, discovery, and snapshot caching between `logicircle-api` and a
//! host (the CLI, or any home-automation runtime).
//!
//! - **[`CloudSession`]**: owns the credentials and the one shared
//!   authenticated session. Re-authentication is single-flight: concurrent
//!   rejections across every camera produce one login.
//!
//! - **[`AccessoryDirectory`]**: lists the cameras on the account in
//!   service order, with startup backoff for transient failures.
//!
//! - **[`SnapshotFetcher`]**: resolves an accessory's image node and
//!   downloads a fresh still image, re-authenticating once on rejection.
//!
//! - **[`CameraEntity`]**: the host-facing camera. Caches the latest
//!   [`Snapshot`], tracks availability, and never runs two fetches at once.
//!
//! - **[`Bridge`]**: lifecycle facade. [`start()`](Bridge::start)
//!   authenticates, discovers, registers entities, and spawns their periodic
//!   refresh tasks; [`shutdown()`](Bridge::shutdown) cancels and joins them.

pub mod bridge;
pub mod config;
pub mod directory;
pub mod entity;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{Bridge, BridgeState, EntityMap, cloud_session};
pub use config::{BackoffPolicy, BridgeConfig, Credentials};
pub use directory::AccessoryDirectory;
pub use entity::{CameraEntity, RefreshOutcome, UNIQUE_ID_PREFIX};
pub use error::{AuthError, CoreError, DirectoryError, FetchError};
pub use fetcher::SnapshotFetcher;
pub use model::{Accessory, Availability, EntityState, Snapshot, find_accessory};
pub use session::{CloudSession, Session};
