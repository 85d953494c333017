//! Declarative configuration schemas bound to pluggable key-value stores.
//!
//! Depend on this crate via `cargo add bonfig`. It bundles the internal crates
//! behind feature flags; the most common items are re-exported at the root
//! and through [`prelude`].
//!
//! ```
//! use bonfig::prelude::*;
//! use serde_json::json;
//!
//! #[derive(Bonfig)]
//! #[bonfig(store = "d")]
//! struct Basic {
//!     #[bonfig(section = "Output", default = 1234)]
//!     pin: Field<i64>,
//!     average: Field<f64>,
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let (schema, fields) = Basic::schema()?;
//! let cfg = Config::load(schema, |stores: &mut Stores| -> anyhow::Result<()> {
//!     stores.insert("d", MemoryStore::from_value(json!({"average": "3.5"}))?)?;
//!     Ok(())
//! })?;
//!
//! assert_eq!(cfg.get(&fields.pin)?, 1234);
//! assert_eq!(cfg.get(&fields.average)?, 3.5);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

extern crate self as bonfig;

/// Keys and paths shared by every crate.
pub use bonfig_primitives as primitives;

/// Backing stores (enabled by `store` feature).
#[cfg(feature = "store")]
pub use bonfig_store as store;

/// Schema declaration, codecs and field kinds (enabled by `schema` feature).
#[cfg(feature = "schema")]
pub use bonfig_schema as schema;

/// Configuration instances (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use bonfig_kernel as kernel;

pub use bonfig_primitives::{FieldPath, Key};

#[cfg(feature = "store")]
pub use bonfig_store::{EnvStore, MemoryStore, SectionedStore, Store};

#[cfg(feature = "schema")]
pub use bonfig_schema::{
    Declare, Field, KindRegistry, Schema, SchemaBuilder, SchemaError, SchemaResult, Section,
};

#[cfg(feature = "kernel")]
pub use bonfig_kernel::{Config, ConfigError, ConfigResult, Stores};

/// Derives [`Declare`] for a struct of [`Field`] handles (enabled by `derive`
/// feature).
#[cfg(feature = "derive")]
pub use bonfig_macros::Bonfig;

/// Glob-importable set of the items most configurations need.
pub mod prelude {
    #[cfg(feature = "derive")]
    pub use crate::Bonfig;
    #[cfg(feature = "kernel")]
    pub use crate::{Config, ConfigError, Stores};
    #[cfg(feature = "schema")]
    pub use crate::{Declare, Field, Schema, Section};
    #[cfg(feature = "store")]
    pub use crate::{EnvStore, MemoryStore, SectionedStore, Store};
}
