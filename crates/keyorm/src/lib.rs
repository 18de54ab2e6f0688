//! ## Crate layout
//! - `core`: typed keys, predicates and their interpreter, the SQL compiler,
//!   queries, the session and observability.
//! - `config`: TOML loading for session settings and dialect selection
//!   (feature `config`, on by default).
//!
//! The `prelude` module carries the vocabulary used to declare entities and
//! build queries; errors, dialects and sinks are imported from their modules.

pub use keyorm_core as core;

#[cfg(feature = "config")]
pub use keyorm_config as config;

pub use keyorm_core::{db, entity, key, model, obs, traits, value};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use keyorm_core::prelude::*;

    #[cfg(feature = "config")]
    pub use keyorm_config::OrmConfig;
}
