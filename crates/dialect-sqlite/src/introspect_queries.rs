pub(crate) const SHOW_SERVER_VERSION: &str = "SELECT sqlite_version()";

pub(crate) const TABLE_NAMES: &str = r"
SELECT name FROM sqlite_master
WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
ORDER BY name ASC;
";

pub(crate) const VIEWS: &str = r"
SELECT name, sql FROM sqlite_master
WHERE type = 'view'
ORDER BY name ASC;
";

/// `table_info(%s)` and `foreign_key_list(%s)` take the table name as a
/// pragma argument rather than a bind parameter; the adapter formats these
/// with the (already-introspected, not user-supplied) table name.
pub(crate) const TABLE_INFO: &str = "PRAGMA table_info(%s);";
pub(crate) const FOREIGN_KEY_LIST: &str = "PRAGMA foreign_key_list(%s);";
pub(crate) const INDEX_LIST: &str = "PRAGMA index_list(%s);";
pub(crate) const INDEX_INFO: &str = "PRAGMA index_info(%s);";
