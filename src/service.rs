use serde::{Deserialize, Serialize};

use crate::model::{default_instance_name, ColumnValue, Entity, EntityBase};
use crate::schema::{TableDef, OP_RECORD_PARAM_TYPE, SERVICE_DISPATCH};

/// Named type of an operation-record parameter vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpRecordParamType {
    #[serde(flatten)]
    base: EntityBase,
    #[serde(default)]
    vector_param_name: Option<String>,
}

impl OpRecordParamType {
    pub fn new(vector_param_name: impl Into<String>) -> Self {
        Self {
            vector_param_name: Some(vector_param_name.into()),
            ..Self::default()
        }
    }

    pub fn vector_param_name(&self) -> Option<&str> {
        self.vector_param_name.as_deref()
    }

    pub fn set_vector_param_name(&mut self, name: Option<String>) {
        self.vector_param_name = name;
    }
}

impl Entity for OpRecordParamType {
    const ENTITY_NAME: &'static str = "mildred$OpRecordParamType";

    fn table() -> &'static TableDef {
        &OP_RECORD_PARAM_TYPE
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn column_values(&self) -> Vec<ColumnValue<'_>> {
        vec![ColumnValue::Text(self.vector_param_name())]
    }

    fn instance_name(&self) -> String {
        default_instance_name(self)
    }
}

/// Routing record naming the module/class/function that handles a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDispatch {
    #[serde(flatten)]
    base: EntityBase,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    package_name: Option<String>,
    #[serde(default)]
    module_name: Option<String>,
    #[serde(default)]
    class_name: Option<String>,
    #[serde(default)]
    func_name: Option<String>,
}

impl ServiceDispatch {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: Some(module_name.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    pub fn set_package_name(&mut self, package_name: Option<String>) {
        self.package_name = package_name;
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    pub fn set_module_name(&mut self, module_name: Option<String>) {
        self.module_name = module_name;
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn set_class_name(&mut self, class_name: Option<String>) {
        self.class_name = class_name;
    }

    pub fn func_name(&self) -> Option<&str> {
        self.func_name.as_deref()
    }

    pub fn set_func_name(&mut self, func_name: Option<String>) {
        self.func_name = func_name;
    }
}

impl Entity for ServiceDispatch {
    const ENTITY_NAME: &'static str = "mildred$ServiceDispatch";

    fn table() -> &'static TableDef {
        &SERVICE_DISPATCH
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn column_values(&self) -> Vec<ColumnValue<'_>> {
        vec![
            ColumnValue::Text(self.name()),
            ColumnValue::Text(self.category()),
            ColumnValue::Text(self.package_name()),
            ColumnValue::Text(self.module_name()),
            ColumnValue::Text(self.class_name()),
            ColumnValue::Text(self.func_name()),
        ]
    }

    /// `"<module> <class> <func>"`; absent parts render empty.
    fn instance_name(&self) -> String {
        format!(
            "{} {} {}",
            self.module_name().unwrap_or_default(),
            self.class_name().unwrap_or_default(),
            self.func_name().unwrap_or_default()
        )
    }
}
