//! Relational schema for the mildred catalog tables.
//!
//! Each entity points at one of the [`TableDef`] constants here. The store
//! reads nullability, length, uniqueness and references from these
//! definitions, so they are the single source of column constraints.

use std::fmt::Write as _;

/// Column storage kinds used by the catalog tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Varchar,
    Timestamp,
    Boolean,
    ForeignKey,
}

/// One non-id column of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
    pub length: Option<usize>,
    pub unique: bool,
    /// Referenced table for foreign keys; the referenced column is always `id`.
    pub references: Option<&'static str>,
}

impl ColumnDef {
    pub const fn varchar(name: &'static str, length: usize) -> Self {
        Self {
            name,
            kind: ColumnKind::Varchar,
            nullable: true,
            length: Some(length),
            unique: false,
            references: None,
        }
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Timestamp,
            nullable: true,
            length: None,
            unique: false,
            references: None,
        }
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Boolean,
            nullable: true,
            length: None,
            unique: false,
            references: None,
        }
    }

    pub const fn foreign_key(name: &'static str, table: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::ForeignKey,
            nullable: true,
            length: None,
            unique: false,
            references: Some(table),
        }
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A table: its name plus the columns after the surrogate `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Tables this one points at through foreign keys.
    pub fn references(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().filter_map(|c| c.references)
    }
}

/// Default VARCHAR length for string columns declared without one.
pub const DEFAULT_VARCHAR_LENGTH: usize = 255;

pub const ACTION_STATUS: TableDef = TableDef {
    name: "action_status",
    columns: &[ColumnDef::varchar("name", DEFAULT_VARCHAR_LENGTH)],
};

pub const DIRECTORY_TYPE: TableDef = TableDef {
    name: "directory_type",
    columns: &[
        ColumnDef::varchar("name", 25).unique(),
        ColumnDef::varchar("desc", DEFAULT_VARCHAR_LENGTH),
    ],
};

pub const DIRECTORY: TableDef = TableDef {
    name: "directory",
    columns: &[
        ColumnDef::varchar("name", 767).not_null(),
        ColumnDef::foreign_key("directory_type_id", "directory_type"),
        ColumnDef::timestamp("effective_dt"),
        ColumnDef::timestamp("expiration_dt"),
        ColumnDef::boolean("active_flag").not_null(),
    ],
};

pub const OP_RECORD_PARAM_TYPE: TableDef = TableDef {
    name: "op_record_param_type",
    columns: &[ColumnDef::varchar("vector_param_name", 128).not_null()],
};

pub const SERVICE_DISPATCH: TableDef = TableDef {
    name: "service_dispatch",
    columns: &[
        ColumnDef::varchar("name", 128),
        ColumnDef::varchar("category", 128),
        ColumnDef::varchar("package_name", 128),
        ColumnDef::varchar("module_name", 128).not_null(),
        ColumnDef::varchar("class_name", 128),
        ColumnDef::varchar("func_name", 128),
    ],
};

/// Every table, referenced tables before the tables that point at them.
pub const ALL_TABLES: [&TableDef; 5] = [
    &ACTION_STATUS,
    &DIRECTORY_TYPE,
    &DIRECTORY,
    &OP_RECORD_PARAM_TYPE,
    &SERVICE_DISPATCH,
];

const RESERVED_WORDS: &[&str] = &["desc", "order", "group", "key", "index"];

fn quote_ident(name: &str) -> String {
    if RESERVED_WORDS.contains(&name) {
        format!("`{name}`")
    } else {
        name.to_string()
    }
}

fn column_sql(column: &ColumnDef) -> String {
    let mut sql = quote_ident(column.name);
    match column.kind {
        ColumnKind::Varchar => {
            let length = column.length.unwrap_or(DEFAULT_VARCHAR_LENGTH);
            let _ = write!(sql, " VARCHAR({length})");
        }
        ColumnKind::Timestamp => sql.push_str(" TIMESTAMP NULL"),
        ColumnKind::Boolean => sql.push_str(" BOOLEAN"),
        ColumnKind::ForeignKey => sql.push_str(" INTEGER"),
    }
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if column.kind == ColumnKind::Boolean && !column.nullable {
        sql.push_str(" DEFAULT FALSE");
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    sql
}

/// Render a `CREATE TABLE` statement (MySQL dialect).
pub fn create_table_sql(table: &TableDef) -> String {
    let mut lines = vec!["    id INTEGER NOT NULL AUTO_INCREMENT PRIMARY KEY".to_string()];
    lines.extend(table.columns.iter().map(|c| format!("    {}", column_sql(c))));
    for column in table.columns {
        if let Some(target) = column.references {
            lines.push(format!(
                "    FOREIGN KEY ({}) REFERENCES {} (id)",
                quote_ident(column.name),
                quote_ident(target)
            ));
        }
    }
    format!(
        "CREATE TABLE {} (\n{}\n);",
        quote_ident(table.name),
        lines.join(",\n")
    )
}

/// DDL for every catalog table.
pub fn schema_sql() -> String {
    ALL_TABLES
        .iter()
        .map(|t| create_table_sql(t))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_ddl_has_constraints_and_fk() {
        let sql = create_table_sql(&DIRECTORY);
        assert!(sql.starts_with("CREATE TABLE directory ("));
        assert!(sql.contains("name VARCHAR(767) NOT NULL"));
        assert!(sql.contains("active_flag BOOLEAN NOT NULL DEFAULT FALSE"));
        assert!(sql.contains("effective_dt TIMESTAMP NULL"));
        assert!(sql.contains("FOREIGN KEY (directory_type_id) REFERENCES directory_type (id)"));
    }

    #[test]
    fn reserved_desc_column_is_quoted() {
        let sql = create_table_sql(&DIRECTORY_TYPE);
        assert!(sql.contains("`desc` VARCHAR(255)"));
        assert!(sql.contains("name VARCHAR(25) UNIQUE"));
    }

    #[test]
    fn referenced_tables_come_first() {
        for (pos, table) in ALL_TABLES.iter().enumerate() {
            for target in table.references() {
                let target_pos = ALL_TABLES.iter().position(|t| t.name == target).unwrap();
                assert!(target_pos < pos, "{} must precede {}", target, table.name);
            }
        }
    }

    fn table_sql<'a>(sql: &'a str, table: &str) -> &'a str {
        let start = sql
            .find(&format!("CREATE TABLE {table} ("))
            .unwrap_or_else(|| panic!("no DDL for {table}"));
        let rest = &sql[start..];
        &rest[..rest.find(");").unwrap()]
    }

    #[test]
    fn ddl_has_every_table_and_column() {
        let expected: [(&str, &[&str]); 5] = [
            ("action_status", &["name"]),
            (
                "directory",
                &[
                    "name",
                    "directory_type_id",
                    "effective_dt",
                    "expiration_dt",
                    "active_flag",
                ],
            ),
            ("directory_type", &["name", "`desc`"]),
            ("op_record_param_type", &["vector_param_name"]),
            (
                "service_dispatch",
                &[
                    "name",
                    "category",
                    "package_name",
                    "module_name",
                    "class_name",
                    "func_name",
                ],
            ),
        ];

        let sql = schema_sql();
        for (table, columns) in expected {
            let ddl = table_sql(&sql, table);
            let declared: Vec<&str> = ddl
                .lines()
                .skip(1)
                .filter_map(|line| line.split_whitespace().next())
                .filter(|word| *word != "FOREIGN")
                .collect();
            let mut wanted = vec!["id"];
            wanted.extend_from_slice(columns);
            assert_eq!(declared, wanted, "columns of {table}");
        }

        let has_line = |table: &str, line: &str| {
            table_sql(&sql, table)
                .lines()
                .any(|l| l.trim().trim_end_matches(',') == line)
        };
        for column in ["name", "category", "package_name", "class_name", "func_name"] {
            assert!(has_line("service_dispatch", &format!("{column} VARCHAR(128)")));
        }
        assert!(has_line("service_dispatch", "module_name VARCHAR(128) NOT NULL"));
        assert!(has_line("op_record_param_type", "vector_param_name VARCHAR(128) NOT NULL"));
        assert!(has_line("action_status", "name VARCHAR(255)"));
        assert!(has_line("directory_type", "`desc` VARCHAR(255)"));
        assert!(has_line("directory", "expiration_dt TIMESTAMP NULL"));
    }

    #[test]
    fn schema_lists_every_table() {
        let sql = schema_sql();
        for name in [
            "action_status",
            "directory_type",
            "directory",
            "op_record_param_type",
            "service_dispatch",
        ] {
            assert!(sql.contains(&format!("CREATE TABLE {name} (")));
        }
        assert_eq!(
            SERVICE_DISPATCH.column("module_name").map(|c| c.nullable),
            Some(false)
        );
    }
}
