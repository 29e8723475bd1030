//! Mildred catalog data model.
//!
//! This crate encodes the catalog tables (action statuses, directories and
//! their types, service dispatch records) as typed entities, together with
//! the relational schema they map to and an in-memory store that enforces
//! the schema's constraints.

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod media;
pub mod model;
pub mod schema;
pub mod service;
pub mod snapshot;
pub mod store;

pub use analysis::ActionStatus;
pub use config::{ConfigError, MildredConfig, SeedConfig, StoreConfig};
pub use media::{Directory, DirectoryType};
pub use model::{check_columns, ColumnValue, Entity, EntityBase, EntityId, ModelError};
pub use service::{OpRecordParamType, ServiceDispatch};
pub use snapshot::{Snapshot, SnapshotError};
pub use store::{EntityStore, StoreError, StoredEntity, Table};
