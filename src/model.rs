use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{ColumnKind, TableDef};

/// Integer surrogate primary key.
pub type EntityId = i64;

/// Identity, optimistic-lock and audit fields shared by every entity.
///
/// `id` stays `None` until the store assigns one; `version` is 0 for an
/// entity that was never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBase {
    #[serde(default)]
    pub(crate) id: Option<EntityId>,
    #[serde(default)]
    pub(crate) version: u32,
    #[serde(default)]
    pub(crate) created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

impl EntityBase {
    /// Base for a row that is being imported with a known key.
    pub fn with_id(id: EntityId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// A column value borrowed from an entity, in table column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnValue<'a> {
    Text(Option<&'a str>),
    Timestamp(Option<DateTime<Utc>>),
    Flag(bool),
    Reference(Option<EntityId>),
}

impl ColumnValue<'_> {
    pub fn is_null(&self) -> bool {
        match self {
            ColumnValue::Text(v) => v.is_none(),
            ColumnValue::Timestamp(v) => v.is_none(),
            ColumnValue::Flag(_) => false,
            ColumnValue::Reference(v) => v.is_none(),
        }
    }

    fn matches_kind(&self, kind: ColumnKind) -> bool {
        matches!(
            (self, kind),
            (ColumnValue::Text(_), ColumnKind::Varchar)
                | (ColumnValue::Timestamp(_), ColumnKind::Timestamp)
                | (ColumnValue::Flag(_), ColumnKind::Boolean)
                | (ColumnValue::Reference(_), ColumnKind::ForeignKey)
        )
    }

    /// Rendering used in constraint error messages.
    pub fn display(&self) -> String {
        match self {
            ColumnValue::Text(Some(v)) => (*v).to_string(),
            ColumnValue::Timestamp(Some(v)) => v.to_rfc3339(),
            ColumnValue::Flag(v) => v.to_string(),
            ColumnValue::Reference(Some(v)) => v.to_string(),
            _ => "NULL".to_string(),
        }
    }
}

/// A struct mapped onto one row of a catalog table.
pub trait Entity: Clone + std::fmt::Debug {
    /// Framework-style entity name, e.g. `mildred$Directory`.
    const ENTITY_NAME: &'static str;

    fn table() -> &'static TableDef;

    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    /// One value per entry of `Self::table().columns`, same order.
    fn column_values(&self) -> Vec<ColumnValue<'_>>;

    /// Human-readable name built from the entity's name pattern.
    fn instance_name(&self) -> String;

    fn id(&self) -> Option<EntityId> {
        self.base().id
    }
}

/// Errors when a row breaks its column constraints.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{table}.{column} is required")]
    MissingRequired {
        table: &'static str,
        column: &'static str,
    },
    #[error("{table}.{column} is {actual} characters long, limit is {max}")]
    TooLong {
        table: &'static str,
        column: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("{table}.{column} holds a value that is not {kind:?}")]
    KindMismatch {
        table: &'static str,
        column: &'static str,
        kind: ColumnKind,
    },
    #[error("{table} row has {actual} column values, table declares {expected}")]
    ColumnMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Validate nullability and length constraints of an entity's columns.
///
/// - A NOT NULL column must hold a value.
/// - With `enforce_lengths`, text must fit the column length (in characters).
pub fn check_columns<E: Entity>(entity: &E, enforce_lengths: bool) -> Result<(), ModelError> {
    let table = E::table();
    let values = entity.column_values();
    if values.len() != table.columns.len() {
        return Err(ModelError::ColumnMismatch {
            table: table.name,
            expected: table.columns.len(),
            actual: values.len(),
        });
    }

    for (column, value) in table.columns.iter().zip(&values) {
        if !value.matches_kind(column.kind) {
            return Err(ModelError::KindMismatch {
                table: table.name,
                column: column.name,
                kind: column.kind,
            });
        }
        if !column.nullable && value.is_null() {
            return Err(ModelError::MissingRequired {
                table: table.name,
                column: column.name,
            });
        }
        if let (true, Some(max), ColumnValue::Text(Some(text))) =
            (enforce_lengths, column.length, value)
        {
            let actual = text.chars().count();
            if actual > max {
                return Err(ModelError::TooLong {
                    table: table.name,
                    column: column.name,
                    max,
                    actual,
                });
            }
        }
    }

    Ok(())
}

/// Fallback display name for entities without a name pattern.
pub(crate) fn default_instance_name<E: Entity>(entity: &E) -> String {
    match entity.id() {
        Some(id) => format!("{}-{}", E::ENTITY_NAME, id),
        None => format!("{}-new", E::ENTITY_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Directory, DirectoryType, OpRecordParamType, ServiceDispatch};

    #[test]
    fn validates_ok_directory() {
        let dir = Directory::new("/media/music");
        check_columns(&dir, true).unwrap();
    }

    #[test]
    fn detects_missing_required_name() {
        let dir = Directory::default();
        let err = check_columns(&dir, true).unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingRequired {
                table: "directory",
                column: "name"
            }
        );
    }

    #[test]
    fn detects_missing_module_and_vector_param_name() {
        let err = check_columns(&ServiceDispatch::default(), true).unwrap_err();
        assert!(matches!(
            err,
            ModelError::MissingRequired {
                column: "module_name",
                ..
            }
        ));
        let err = check_columns(&OpRecordParamType::default(), true).unwrap_err();
        assert!(matches!(
            err,
            ModelError::MissingRequired {
                column: "vector_param_name",
                ..
            }
        ));
    }

    #[test]
    fn detects_too_long_text_only_when_enforced() {
        let ty = DirectoryType::new("a".repeat(26));
        let err = check_columns(&ty, true).unwrap_err();
        assert!(matches!(err, ModelError::TooLong { max: 25, actual: 26, .. }));
        check_columns(&ty, false).unwrap();
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let ty = DirectoryType::new("é".repeat(25));
        check_columns(&ty, true).unwrap();
    }

    #[derive(Debug, Clone, Default)]
    struct Misdeclared {
        base: EntityBase,
    }

    impl Entity for Misdeclared {
        const ENTITY_NAME: &'static str = "mildred$Misdeclared";

        fn table() -> &'static TableDef {
            &crate::schema::OP_RECORD_PARAM_TYPE
        }

        fn base(&self) -> &EntityBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut EntityBase {
            &mut self.base
        }

        fn column_values(&self) -> Vec<ColumnValue<'_>> {
            vec![ColumnValue::Flag(true)]
        }

        fn instance_name(&self) -> String {
            default_instance_name(self)
        }
    }

    #[test]
    fn detects_value_of_wrong_kind() {
        let err = check_columns(&Misdeclared::default(), true).unwrap_err();
        assert_eq!(
            err,
            ModelError::KindMismatch {
                table: "op_record_param_type",
                column: "vector_param_name",
                kind: ColumnKind::Varchar
            }
        );
        assert_eq!(
            err.to_string(),
            "op_record_param_type.vector_param_name holds a value that is not Varchar"
        );
    }

    #[test]
    fn new_base_has_no_identity() {
        let base = EntityBase::default();
        assert!(base.is_new());
        assert_eq!(base.version(), 0);
        assert_eq!(EntityBase::with_id(7).id(), Some(7));
    }

    #[test]
    fn fallback_instance_name_uses_entity_name() {
        let mut param = OpRecordParamType::new("vector");
        assert_eq!(param.instance_name(), "mildred$OpRecordParamType-new");
        param.base_mut().id = Some(3);
        assert_eq!(param.instance_name(), "mildred$OpRecordParamType-3");
    }
}
