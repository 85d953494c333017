//! Schema declaration for configurations.
//!
//! A schema names the stores a configuration reads from and the fields bound
//! into them. Fields are declared through a [`StoreRef`] or a [`Section`],
//! which fix the store and path prefix, and registered on a
//! [`SchemaBuilder`], which rejects colliding declarations up front:
//!
//! ```
//! use bonfig_schema::Schema;
//!
//! # fn main() -> Result<(), bonfig_schema::SchemaError> {
//! let mut builder = Schema::builder("Basic");
//! let d = builder.store("d")?;
//! let output = d.section("Output")?;
//! let pin = builder.add(output.int("pin")?.default(1234))?;
//! let schema = builder.build();
//!
//! assert_eq!(pin.path().to_string(), "Output/pin");
//! assert_eq!(schema.fields().len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

pub mod codec;
mod error;
mod field;
pub mod registry;
mod schema;
mod section;

pub use codec::Codec;
pub use error::{CodecError, CodecResult, SchemaError, SchemaResult};
pub use field::{Field, FieldDef, FieldSpec, FieldType};
pub use registry::{DynCodec, KindRegistry};
pub use schema::{Declare, Schema, SchemaBuilder};
pub use section::{Section, StoreRef};
