//! Declarative table definitions
//!
//! Tables are described as data so the migrator can both create them and
//! diff them against what already exists.

/// Column definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
    pub primary_key: bool,
    pub default: Option<&'static str>,
    /// Referenced table; the referenced column is always `id`
    pub references: Option<&'static str>,
    pub check: Option<&'static str>,
    /// Value written into existing rows when the column is added to a
    /// populated table and has no default
    pub fill: Option<&'static str>,
}

impl ColumnDef {
    pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
            primary_key: false,
            default: None,
            references: None,
            check: None,
            fill: None,
        }
    }

    pub const fn primary_key(self) -> Self {
        Self {
            primary_key: true,
            nullable: false,
            ..self
        }
    }

    pub const fn not_null(self) -> Self {
        Self {
            nullable: false,
            ..self
        }
    }

    pub const fn default(self, expr: &'static str) -> Self {
        Self {
            default: Some(expr),
            ..self
        }
    }

    pub const fn references(self, table: &'static str) -> Self {
        Self {
            references: Some(table),
            ..self
        }
    }

    pub const fn check(self, expr: &'static str) -> Self {
        Self {
            check: Some(expr),
            ..self
        }
    }

    pub const fn fill(self, expr: &'static str) -> Self {
        Self {
            fill: Some(expr),
            ..self
        }
    }

    /// Column definition as used in `CREATE TABLE` and `ADD COLUMN`
    pub fn definition(&self) -> String {
        self.render(!self.nullable)
    }

    /// A `NOT NULL` column without a default cannot be added to a table
    /// that already has rows in one statement.
    pub fn needs_backfill(&self) -> bool {
        !self.nullable && !self.primary_key && self.default.is_none()
    }

    /// Statements adding this column to an existing table.
    ///
    /// Columns that need a backfill are added nullable, filled from
    /// [`fill`](Self::fill) when one is declared, and tightened with
    /// [`set_not_null_sql`](Self::set_not_null_sql) by the migrator once
    /// no `NULL` is left.
    pub fn add_sql(&self, table: &str) -> Vec<String> {
        if !self.needs_backfill() {
            return vec![format!(
                "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {}",
                table,
                self.definition()
            )];
        }

        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {}",
            table,
            self.render(false)
        )];
        if let Some(fill) = self.fill {
            statements.push(format!(
                "UPDATE {} SET {} = {} WHERE {} IS NULL",
                table, self.name, fill, self.name
            ));
        }
        statements
    }

    pub fn set_not_null_sql(&self, table: &str) -> String {
        format!("ALTER TABLE {} ALTER COLUMN {} SET NOT NULL", table, self.name)
    }

    fn render(&self, not_null: bool) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if let Some(table) = self.references {
            sql.push_str(&format!(" REFERENCES {} (id)", table));
        }
        if let Some(check) = self.check {
            sql.push_str(&format!(" CHECK ({})", check));
        }
        sql
    }
}

/// Index definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub unique: bool,
}

impl IndexDef {
    pub const fn new(name: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            name,
            columns,
            unique: false,
        }
    }

    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }

    pub fn create_sql(&self, table: &str) -> String {
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            self.name,
            table,
            self.columns.join(", ")
        )
    }
}

/// Table definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    pub indexes: &'static [IndexDef],
}

impl TableDef {
    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDef::definition).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            columns.join(",\n    ")
        )
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

const ID: ColumnDef = ColumnDef::new("id", "BIGSERIAL").primary_key();
const CREATED_AT: ColumnDef = ColumnDef::new("created_at", "TIMESTAMPTZ").not_null().default("NOW()");
const UPDATED_AT: ColumnDef = ColumnDef::new("updated_at", "TIMESTAMPTZ").not_null().default("NOW()");
const DELETED_AT: ColumnDef = ColumnDef::new("deleted_at", "TIMESTAMPTZ");

pub const USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ID,
        ColumnDef::new("username", "VARCHAR(50)").not_null().fill("'user_' || id"),
        ColumnDef::new("email", "VARCHAR(100)"),
        ColumnDef::new("password_hash", "VARCHAR(255)").not_null().fill("''"),
        ColumnDef::new("post_count", "BIGINT").not_null().default("0"),
        CREATED_AT,
        UPDATED_AT,
        DELETED_AT,
    ],
    indexes: &[
        IndexDef::new("idx_users_username", &["username"]).unique(),
        IndexDef::new("idx_users_email", &["email"]).unique(),
        IndexDef::new("idx_users_deleted_at", &["deleted_at"]),
    ],
};

pub const POSTS: TableDef = TableDef {
    name: "posts",
    columns: &[
        ID,
        ColumnDef::new("title", "VARCHAR(200)").not_null().fill("''"),
        ColumnDef::new("content", "TEXT").not_null().fill("''"),
        ColumnDef::new("user_id", "BIGINT").not_null().references("users"),
        ColumnDef::new("comment_status", "VARCHAR(20)")
            .not_null()
            .default("'no_comments'")
            .check("comment_status IN ('has_comments', 'no_comments')"),
        CREATED_AT,
        UPDATED_AT,
        DELETED_AT,
    ],
    indexes: &[
        IndexDef::new("idx_posts_user_id", &["user_id"]),
        IndexDef::new("idx_posts_deleted_at", &["deleted_at"]),
    ],
};

pub const COMMENTS: TableDef = TableDef {
    name: "comments",
    columns: &[
        ID,
        ColumnDef::new("content", "TEXT").not_null().fill("''"),
        ColumnDef::new("post_id", "BIGINT").not_null().references("posts"),
        ColumnDef::new("user_id", "BIGINT").not_null().references("users"),
        CREATED_AT,
        UPDATED_AT,
        DELETED_AT,
    ],
    indexes: &[
        IndexDef::new("idx_comments_post_id", &["post_id"]),
        IndexDef::new("idx_comments_user_id", &["user_id"]),
        IndexDef::new("idx_comments_deleted_at", &["deleted_at"]),
    ],
};

/// All tables, parents before children
pub const TABLES: &[TableDef] = &[USERS, POSTS, COMMENTS];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_in_dependency_order() {
        let names: Vec<&str> = TABLES.iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["users", "posts", "comments"]);

        // every referenced table appears earlier in the list
        for (i, table) in TABLES.iter().enumerate() {
            for column in table.columns {
                if let Some(parent) = column.references {
                    assert!(TABLES[..i].iter().any(|t| t.name == parent));
                }
            }
        }
    }

    #[test]
    fn test_every_table_is_soft_deletable() {
        for table in TABLES {
            let id = table.column("id").unwrap();
            assert!(id.primary_key);
            assert_eq!(id.sql_type, "BIGSERIAL");

            let deleted_at = table.column("deleted_at").unwrap();
            assert!(deleted_at.nullable);
            assert!(table.indexes.iter().any(|i| i.columns == ["deleted_at"]));
        }
    }

    #[test]
    fn test_foreign_keys_are_indexed() {
        for table in TABLES {
            for column in table.columns.iter().filter(|c| c.references.is_some()) {
                assert!(
                    table.indexes.iter().any(|i| i.columns.first() == Some(&column.name)),
                    "{}.{} has no index",
                    table.name,
                    column.name
                );
            }
        }
    }

    #[test]
    fn test_column_definition() {
        let status = POSTS.column("comment_status").unwrap();
        assert_eq!(
            status.definition(),
            "comment_status VARCHAR(20) NOT NULL DEFAULT 'no_comments' \
             CHECK (comment_status IN ('has_comments', 'no_comments'))"
        );
        assert_eq!(
            COMMENTS.column("post_id").unwrap().definition(),
            "post_id BIGINT NOT NULL REFERENCES posts (id)"
        );
        assert_eq!(ID.definition(), "id BIGSERIAL PRIMARY KEY");
    }

    #[test]
    fn test_index_sql() {
        assert_eq!(
            USERS.indexes[0].create_sql("users"),
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users (username)"
        );
        assert_eq!(
            COMMENTS.indexes[0].create_sql("comments"),
            "CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments (post_id)"
        );
    }

    #[test]
    fn test_create_table_sql() {
        let sql = USERS.create_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS users ("));
        assert!(sql.contains("post_count BIGINT NOT NULL DEFAULT 0"));
        assert!(sql.contains("email VARCHAR(100),"));
    }

    #[test]
    fn test_add_column_with_default_is_one_statement() {
        let status = POSTS.column("comment_status").unwrap();
        assert!(!status.needs_backfill());
        assert_eq!(
            status.add_sql("posts"),
            vec![format!("ALTER TABLE posts ADD COLUMN IF NOT EXISTS {}", status.definition())]
        );

        let email = USERS.column("email").unwrap();
        assert!(!email.needs_backfill());
        assert_eq!(email.add_sql("users").len(), 1);
    }

    #[test]
    fn test_add_required_column_is_filled_before_not_null() {
        let hash = USERS.column("password_hash").unwrap();
        assert!(hash.needs_backfill());
        assert_eq!(
            hash.add_sql("users"),
            vec![
                "ALTER TABLE users ADD COLUMN IF NOT EXISTS password_hash VARCHAR(255)".to_string(),
                "UPDATE users SET password_hash = '' WHERE password_hash IS NULL".to_string(),
            ]
        );
        assert_eq!(
            hash.set_not_null_sql("users"),
            "ALTER TABLE users ALTER COLUMN password_hash SET NOT NULL"
        );
    }

    #[test]
    fn test_required_foreign_key_has_no_fill() {
        let post_id = COMMENTS.column("post_id").unwrap();
        assert!(post_id.needs_backfill());
        assert_eq!(
            post_id.add_sql("comments"),
            vec!["ALTER TABLE comments ADD COLUMN IF NOT EXISTS post_id BIGINT REFERENCES posts (id)"
                .to_string()]
        );
    }

    #[test]
    fn test_every_required_text_column_declares_a_fill() {
        for table in TABLES {
            for column in table.columns.iter().filter(|c| c.needs_backfill()) {
                if column.references.is_none() {
                    assert!(column.fill.is_some(), "{}.{} has no fill", table.name, column.name);
                }
            }
        }
    }
}
