use serde::{Deserialize, Serialize};

use crate::model::{ColumnValue, Entity, EntityBase};
use crate::schema::{TableDef, ACTION_STATUS};

/// A named status code attached to analysis actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStatus {
    #[serde(flatten)]
    base: EntityBase,
    #[serde(default)]
    name: Option<String>,
}

impl ActionStatus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }
}

impl Entity for ActionStatus {
    const ENTITY_NAME: &'static str = "mildred$ActionStatus";

    fn table() -> &'static TableDef {
        &ACTION_STATUS
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn column_values(&self) -> Vec<ColumnValue<'_>> {
        vec![ColumnValue::Text(self.name())]
    }

    fn instance_name(&self) -> String {
        self.name.clone().unwrap_or_default()
    }
}
