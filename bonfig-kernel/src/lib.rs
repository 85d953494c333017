//! Configuration instances for bonfig schemas.
//!
//! A [`Config`] owns one store per name its [`Schema`](bonfig_schema::Schema)
//! declares. Construction runs user load logic, materialises field defaults,
//! and by default locks the instance so that subsequent writes fail until it
//! is explicitly unlocked.

#![warn(missing_docs, clippy::pedantic)]

mod config;
mod error;
mod lifecycle;
mod stores;

pub use config::{Config, ConfigBuilder, UnlockGuard};
pub use error::{ConfigError, ConfigResult};
pub use lifecycle::{ConfigState, LifecycleError, LifecycleEvent, LifecycleResult};
pub use stores::{Loader, Stores};
