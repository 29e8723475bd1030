//! Media directories and their categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ColumnValue, Entity, EntityBase, EntityId};
use crate::schema::{TableDef, DIRECTORY, DIRECTORY_TYPE};

/// Category of a directory entry (e.g. `collection`, `format`, `path`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryType {
    #[serde(flatten)]
    base: EntityBase,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    desc: Option<String>,
}

impl DirectoryType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn set_desc(&mut self, desc: Option<String>) {
        self.desc = desc;
    }
}

impl Entity for DirectoryType {
    const ENTITY_NAME: &'static str = "mildred$DirectoryType";

    fn table() -> &'static TableDef {
        &DIRECTORY_TYPE
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn column_values(&self) -> Vec<ColumnValue<'_>> {
        vec![ColumnValue::Text(self.name()), ColumnValue::Text(self.desc())]
    }

    fn instance_name(&self) -> String {
        self.name.clone().unwrap_or_default()
    }
}

/// A named directory with an optional type and validity window.
///
/// The type is held as a foreign key; resolve it through
/// [`crate::catalog::directory_type_of`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    #[serde(flatten)]
    base: EntityBase,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    directory_type_id: Option<EntityId>,
    #[serde(default)]
    effective_dt: Option<DateTime<Utc>>,
    #[serde(default)]
    expiration_dt: Option<DateTime<Utc>>,
    #[serde(default)]
    active_flag: bool,
}

impl Directory {
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

    pub fn directory_type_id(&self) -> Option<EntityId> {
        self.directory_type_id
    }

    pub fn set_directory_type_id(&mut self, id: Option<EntityId>) {
        self.directory_type_id = id;
    }

    /// Point at a stored type. A type without an id clears the reference.
    pub fn set_directory_type(&mut self, directory_type: &DirectoryType) {
        self.directory_type_id = directory_type.id();
    }

    pub fn effective_dt(&self) -> Option<DateTime<Utc>> {
        self.effective_dt
    }

    pub fn set_effective_dt(&mut self, at: Option<DateTime<Utc>>) {
        self.effective_dt = at;
    }

    pub fn expiration_dt(&self) -> Option<DateTime<Utc>> {
        self.expiration_dt
    }

    pub fn set_expiration_dt(&mut self, at: Option<DateTime<Utc>>) {
        self.expiration_dt = at;
    }

    pub fn active_flag(&self) -> bool {
        self.active_flag
    }

    pub fn set_active_flag(&mut self, active: bool) {
        self.active_flag = active;
    }

    /// Active, already effective, and not yet expired at `at`.
    ///
    /// The window bounds are not checked against each other; a window whose
    /// expiration precedes its effective date is never effective.
    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        self.active_flag
            && self.effective_dt.map_or(true, |from| from <= at)
            && self.expiration_dt.map_or(true, |until| at < until)
    }
}

impl Entity for Directory {
    const ENTITY_NAME: &'static str = "mildred$Directory";

    fn table() -> &'static TableDef {
        &DIRECTORY
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
            ColumnValue::Reference(self.directory_type_id),
            ColumnValue::Timestamp(self.effective_dt),
            ColumnValue::Timestamp(self.expiration_dt),
            ColumnValue::Flag(self.active_flag),
        ]
    }

    fn instance_name(&self) -> String {
        self.name.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn active_flag_defaults_false() {
        assert!(!Directory::default().active_flag());
        assert!(!Directory::new("/media").active_flag());
        let parsed: Directory = serde_json::from_str(r#"{"name":"/media"}"#).unwrap();
        assert!(!parsed.active_flag());
    }

    #[test]
    fn directory_accessors_round_trip() {
        let mut dir = Directory::default();
        dir.set_name(Some("/media/films".into()));
        dir.set_directory_type_id(Some(4));
        dir.set_effective_dt(Some(noon()));
        dir.set_expiration_dt(Some(noon() + Duration::days(1)));
        dir.set_active_flag(true);

        assert_eq!(dir.name(), Some("/media/films"));
        assert_eq!(dir.directory_type_id(), Some(4));
        assert_eq!(dir.effective_dt(), Some(noon()));
        assert_eq!(dir.expiration_dt(), Some(noon() + Duration::days(1)));
        assert!(dir.active_flag());
        assert_eq!(dir.instance_name(), "/media/films");

        dir.set_directory_type_id(None);
        assert_eq!(dir.directory_type_id(), None);
    }

    #[test]
    fn directory_type_accessors_round_trip() {
        let mut ty = DirectoryType::new("format").with_desc("by file format");
        assert_eq!(ty.name(), Some("format"));
        assert_eq!(ty.desc(), Some("by file format"));
        ty.set_desc(None);
        ty.set_name(Some("collection".into()));
        assert_eq!(ty.desc(), None);
        assert_eq!(ty.instance_name(), "collection");
    }

    #[test]
    fn unsaved_type_clears_reference() {
        let mut dir = Directory::new("/a");
        dir.set_directory_type_id(Some(1));
        dir.set_directory_type(&DirectoryType::new("path"));
        assert_eq!(dir.directory_type_id(), None);
    }

    #[test]
    fn effective_window_bounds() {
        let mut dir = Directory::new("/a");
        assert!(!dir.is_effective_at(noon()));

        dir.set_active_flag(true);
        assert!(dir.is_effective_at(noon()));

        dir.set_effective_dt(Some(noon()));
        assert!(dir.is_effective_at(noon()));
        assert!(!dir.is_effective_at(noon() - Duration::seconds(1)));

        dir.set_expiration_dt(Some(noon() + Duration::hours(1)));
        assert!(dir.is_effective_at(noon() + Duration::minutes(59)));
        assert!(!dir.is_effective_at(noon() + Duration::hours(1)));
    }

    #[test]
    fn inverted_window_is_stored_but_never_effective() {
        let mut dir = Directory::new("/a");
        dir.set_active_flag(true);
        dir.set_effective_dt(Some(noon()));
        dir.set_expiration_dt(Some(noon() - Duration::days(1)));
        assert_eq!(dir.expiration_dt(), Some(noon() - Duration::days(1)));
        assert!(!dir.is_effective_at(noon()));
    }
}
