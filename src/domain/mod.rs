//! Domain layer - configuration mini-languages and secret derivation
//!
//! Pure functions with no environment access, usable on their own.

pub mod secrets;
pub mod standby;
pub mod volumes;

pub use secrets::{derive_secret, IMAGE_TOKEN_SECRET_PURPOSE, SERVICE_SECRET_PURPOSE};
pub use standby::{parse_standby_configs, StandbyOAuthConfig};
pub use volumes::{parse_volumes, StorageVolumeRecord, DEFAULT_VOLUME_TABLE};
