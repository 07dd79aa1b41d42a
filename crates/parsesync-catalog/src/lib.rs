//! Schema service adapters
//!
//! A [`SchemaService`] reads the live class schema of a remote data service
//! and applies create/update/delete requests to it.
//!
//! - [`ParseAdapter`] talks to a Parse Server over its REST API
//! - [`MockAdapter`] keeps classes in memory for tests and demos
//!
//! ## Example
//!
//! ```rust,ignore
//! use parsesync_catalog::{ParseAdapter, SchemaService};
//!
//! let adapter = ParseAdapter::new(&connection)?;
//! for class in &adapter.fetch_schemas().await? {
//!     println!("{}", class.class_name);
//! }
//! ```

pub mod adapter;
pub mod mock;
pub mod parse;

pub use adapter::{SchemaService, ServiceError};
pub use mock::{MockAdapter, RecordedRequest};
pub use parse::ParseAdapter;
