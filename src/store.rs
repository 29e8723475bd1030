use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::model::{check_columns, ColumnValue, Entity, EntityId, ModelError};
use crate::{ActionStatus, Directory, DirectoryType, OpRecordParamType, ServiceDispatch};

/// Rows of one table keyed by surrogate id.
#[derive(Debug, Clone)]
pub struct Table<E> {
    rows: BTreeMap<EntityId, E>,
    last_id: EntityId,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<E: Entity> Table<E> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in id order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }

    fn contains(&self, table: &str, id: EntityId) -> bool {
        E::table().name == table && self.rows.contains_key(&id)
    }

    /// First `(table, column)` of this table whose foreign key points at `target`/`id`.
    fn referencing(&self, target: &str, id: EntityId) -> Option<(&'static str, &'static str)> {
        let def = E::table();
        def.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.references == Some(target))
            .find(|(idx, _)| {
                self.rows.values().any(|row| {
                    row.column_values().get(*idx) == Some(&ColumnValue::Reference(Some(id)))
                })
            })
            .map(|(_, c)| (def.name, c.name))
    }
}

/// An entity with a table inside [`EntityStore`].
pub trait StoredEntity: Entity {
    fn table_in(store: &EntityStore) -> &Table<Self>;
    fn table_in_mut(store: &mut EntityStore) -> &mut Table<Self>;
}

macro_rules! stored_entity {
    ($ty:ty, $field:ident) => {
        impl StoredEntity for $ty {
            fn table_in(store: &EntityStore) -> &Table<Self> {
                &store.$field
            }

            fn table_in_mut(store: &mut EntityStore) -> &mut Table<Self> {
                &mut store.$field
            }
        }
    };
}

stored_entity!(ActionStatus, action_statuses);
stored_entity!(DirectoryType, directory_types);
stored_entity!(Directory, directories);
stored_entity!(OpRecordParamType, op_record_param_types);
stored_entity!(ServiceDispatch, service_dispatches);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: EntityId },
    #[error("{table} row has no id; insert it first")]
    Unsaved { table: &'static str },
    #[error("{table} row {id} already exists")]
    DuplicateId { table: &'static str, id: EntityId },
    #[error("{table} id {id} is not a positive surrogate key")]
    InvalidId { table: &'static str, id: EntityId },
    #[error("{table} has no surrogate keys left")]
    IdsExhausted { table: &'static str },
    #[error("{table}.{column} value {value:?} already exists")]
    UniqueViolation {
        table: &'static str,
        column: &'static str,
        value: String,
    },
    #[error("{table}.{column} references missing {target} row {id}")]
    MissingReference {
        table: &'static str,
        column: &'static str,
        target: &'static str,
        id: EntityId,
    },
    #[error("{table} row {id} is still referenced by {by_table}.{by_column}")]
    StillReferenced {
        table: &'static str,
        id: EntityId,
        by_table: &'static str,
        by_column: &'static str,
    },
    #[error("{table} row {id} is at version {expected}, write was based on version {actual}")]
    StaleVersion {
        table: &'static str,
        id: EntityId,
        expected: u32,
        actual: u32,
    },
}

/// In-memory catalog store.
///
/// Enforces the constraints the relational schema declares: NOT NULL,
/// column lengths, UNIQUE columns, foreign keys (restrict on delete),
/// surrogate key assignment and optimistic locking on update.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    config: StoreConfig,
    action_statuses: Table<ActionStatus>,
    directory_types: Table<DirectoryType>,
    directories: Table<Directory>,
    op_record_param_types: Table<OpRecordParamType>,
    service_dispatches: Table<ServiceDispatch>,
}

impl EntityStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn table<E: StoredEntity>(&self) -> &Table<E> {
        E::table_in(self)
    }

    pub fn find<E: StoredEntity>(&self, id: EntityId) -> Option<&E> {
        E::table_in(self).rows.get(&id)
    }

    /// All rows of a table in id order.
    pub fn list<E: StoredEntity>(&self) -> Vec<&E> {
        E::table_in(self).iter().collect()
    }

    pub fn count<E: StoredEntity>(&self) -> usize {
        E::table_in(self).len()
    }

    /// Store a new row and return the stored copy.
    ///
    /// A missing id gets the next surrogate key; a given id must be free.
    pub fn insert<E: StoredEntity>(&mut self, entity: E) -> Result<E, StoreError> {
        self.insert_row(entity, false)
    }

    /// Insert keeping the row's version and audit timestamps (bulk import).
    pub(crate) fn restore<E: StoredEntity>(&mut self, entity: E) -> Result<E, StoreError> {
        self.insert_row(entity, true)
    }

    fn insert_row<E: StoredEntity>(
        &mut self,
        mut entity: E,
        keep_audit: bool,
    ) -> Result<E, StoreError> {
        let table = E::table().name;
        self.check_write(&entity, None)?;

        let rows = E::table_in(self);
        let id = match entity.id() {
            Some(id) if rows.rows.contains_key(&id) => {
                warn!(table, id, "rejected insert with taken id");
                return Err(StoreError::DuplicateId { table, id });
            }
            Some(id) if id <= 0 => {
                warn!(table, id, "rejected insert with non-positive id");
                return Err(StoreError::InvalidId { table, id });
            }
            Some(id) => id,
            None => rows
                .last_id
                .checked_add(1)
                .ok_or(StoreError::IdsExhausted { table })?,
        };

        let now = Utc::now();
        let base = entity.base_mut();
        base.id = Some(id);
        if !keep_audit || base.version == 0 {
            base.version = 1;
        }
        if !keep_audit || base.created_at.is_none() {
            base.created_at = Some(now);
        }
        if !keep_audit || base.updated_at.is_none() {
            base.updated_at = base.created_at;
        }

        let rows = E::table_in_mut(self);
        rows.last_id = rows.last_id.max(id);
        rows.rows.insert(id, entity.clone());
        debug!(table, id, "inserted row");
        Ok(entity)
    }

    /// Replace a stored row, bumping its version.
    pub fn update<E: StoredEntity>(&mut self, mut entity: E) -> Result<E, StoreError> {
        let table = E::table().name;
        let id = entity.id().ok_or(StoreError::Unsaved { table })?;
        let stored = E::table_in(self)
            .rows
            .get(&id)
            .ok_or(StoreError::NotFound { table, id })?;
        let stored_version = stored.base().version();
        let created_at = stored.base().created_at();

        let version = entity.base().version();
        if self.config.optimistic_locking && version != stored_version {
            warn!(table, id, stored_version, version, "rejected stale update");
            return Err(StoreError::StaleVersion {
                table,
                id,
                expected: stored_version,
                actual: version,
            });
        }
        self.check_write(&entity, Some(id))?;

        let base = entity.base_mut();
        base.version = stored_version + 1;
        base.created_at = created_at;
        base.updated_at = Some(Utc::now());

        E::table_in_mut(self).rows.insert(id, entity.clone());
        debug!(table, id, version = stored_version + 1, "updated row");
        Ok(entity)
    }

    /// Remove a row that nothing references and return it.
    pub fn delete<E: StoredEntity>(&mut self, id: EntityId) -> Result<E, StoreError> {
        let table = E::table().name;
        if !E::table_in(self).rows.contains_key(&id) {
            return Err(StoreError::NotFound { table, id });
        }
        if let Some((by_table, by_column)) = self.first_reference(table, id) {
            warn!(table, id, by_table, "rejected delete of referenced row");
            return Err(StoreError::StillReferenced {
                table,
                id,
                by_table,
                by_column,
            });
        }
        let removed = E::table_in_mut(self)
            .rows
            .remove(&id)
            .ok_or(StoreError::NotFound { table, id })?;
        debug!(table, id, "deleted row");
        Ok(removed)
    }

    /// Column, uniqueness and foreign-key checks. `existing` is the id of the
    /// row being replaced, excluded from uniqueness.
    fn check_write<E: StoredEntity>(
        &self,
        entity: &E,
        existing: Option<EntityId>,
    ) -> Result<(), StoreError> {
        let result = self.check_constraints(entity, existing);
        if let Err(err) = &result {
            warn!(table = E::table().name, error = %err, "rejected write");
        }
        result
    }

    fn check_constraints<E: StoredEntity>(
        &self,
        entity: &E,
        existing: Option<EntityId>,
    ) -> Result<(), StoreError> {
        check_columns(entity, self.config.enforce_lengths)?;

        let def = E::table();
        let values = entity.column_values();
        for (idx, (column, value)) in def.columns.iter().zip(&values).enumerate() {
            if column.unique && !value.is_null() {
                let taken = E::table_in(self)
                    .rows
                    .iter()
                    .filter(|(id, _)| Some(**id) != existing)
                    .any(|(_, row)| row.column_values().get(idx) == Some(value));
                if taken {
                    return Err(StoreError::UniqueViolation {
                        table: def.name,
                        column: column.name,
                        value: value.display(),
                    });
                }
            }

            if let (Some(target), ColumnValue::Reference(Some(id))) = (column.references, value) {
                if !self.row_exists(target, *id) {
                    return Err(StoreError::MissingReference {
                        table: def.name,
                        column: column.name,
                        target,
                        id: *id,
                    });
                }
            }
        }
        Ok(())
    }

    fn row_exists(&self, table: &str, id: EntityId) -> bool {
        self.action_statuses.contains(table, id)
            || self.directory_types.contains(table, id)
            || self.directories.contains(table, id)
            || self.op_record_param_types.contains(table, id)
            || self.service_dispatches.contains(table, id)
    }

    fn first_reference(&self, table: &str, id: EntityId) -> Option<(&'static str, &'static str)> {
        self.action_statuses
            .referencing(table, id)
            .or_else(|| self.directory_types.referencing(table, id))
            .or_else(|| self.directories.referencing(table, id))
            .or_else(|| self.op_record_param_types.referencing(table, id))
            .or_else(|| self.service_dispatches.referencing(table, id))
    }
}
