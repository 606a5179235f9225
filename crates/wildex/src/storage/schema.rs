//! `SQLite` schema definitions for wildex.

/// SQL statement to create the locations table.
///
/// `payload` holds the protobuf encoding produced by the location codec.
pub const CREATE_LOCATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS locations (
    key TEXT PRIMARY KEY,
    payload BLOB NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `updated_at` for recency listing.
pub const CREATE_UPDATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_locations_updated ON locations(updated_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_LOCATIONS_TABLE,
    CREATE_UPDATED_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_create_locations_table_contains_required_columns() {
        assert!(CREATE_LOCATIONS_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_LOCATIONS_TABLE.contains("payload BLOB NOT NULL"));
        assert!(CREATE_LOCATIONS_TABLE.contains("updated_at TEXT NOT NULL"));
    }
}
