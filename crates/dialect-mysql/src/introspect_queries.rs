pub(crate) const SHOW_SERVER_VERSION: &str = "SELECT VERSION()";

pub(crate) const TABLE_NAMES: &str = r"
SELECT TABLE_NAME AS table_name
FROM INFORMATION_SCHEMA.TABLES
WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
ORDER BY TABLE_NAME ASC;
";

pub(crate) const TABLE_COLUMNS: &str = r"
SELECT
  COLUMN_NAME AS column_name,
  COLUMN_TYPE AS data_type,
  IS_NULLABLE = 'YES' AS nullable,
  EXTRA LIKE '%auto_increment%' AS identity,
  COLUMN_DEFAULT AS default_expr
FROM INFORMATION_SCHEMA.COLUMNS
WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
ORDER BY ORDINAL_POSITION ASC;
";

pub(crate) const TABLE_CONSTRAINTS: &str = r"
SELECT
  tc.CONSTRAINT_NAME AS constraint_name,
  tc.CONSTRAINT_TYPE AS constraint_type,
  GROUP_CONCAT(kcu.COLUMN_NAME ORDER BY kcu.ORDINAL_POSITION) AS columns,
  MAX(kcu.REFERENCED_TABLE_SCHEMA) AS referenced_schema,
  MAX(kcu.REFERENCED_TABLE_NAME) AS referenced_table,
  GROUP_CONCAT(kcu.REFERENCED_COLUMN_NAME ORDER BY kcu.ORDINAL_POSITION) AS referenced_columns,
  MAX(rc.DELETE_RULE) AS on_delete,
  MAX(rc.UPDATE_RULE) AS on_update
FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
INNER JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
  ON kcu.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA AND kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME AND kcu.TABLE_NAME = tc.TABLE_NAME
LEFT JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
  ON rc.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA AND rc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME
WHERE tc.TABLE_SCHEMA = ? AND tc.TABLE_NAME = ?
GROUP BY tc.CONSTRAINT_NAME, tc.CONSTRAINT_TYPE
ORDER BY tc.CONSTRAINT_NAME ASC;
";

pub(crate) const TABLE_INDEXES: &str = r"
SELECT
  INDEX_NAME AS index_name,
  GROUP_CONCAT(COLUMN_NAME ORDER BY SEQ_IN_INDEX) AS columns,
  NOT MAX(NON_UNIQUE) AS is_unique,
  INDEX_NAME = 'PRIMARY' AS is_clustered
FROM INFORMATION_SCHEMA.STATISTICS
WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND INDEX_NAME != 'PRIMARY'
GROUP BY INDEX_NAME
ORDER BY INDEX_NAME ASC;
";

pub(crate) const VIEWS: &str = r"
SELECT TABLE_NAME AS table_name, VIEW_DEFINITION AS view_definition
FROM INFORMATION_SCHEMA.VIEWS
WHERE TABLE_SCHEMA = ?
ORDER BY TABLE_NAME ASC;
";

pub(crate) const ROUTINES: &str = r"
SELECT ROUTINE_NAME AS routine_name, ROUTINE_TYPE AS routine_type, ROUTINE_DEFINITION AS routine_definition, DTD_IDENTIFIER AS data_type
FROM INFORMATION_SCHEMA.ROUTINES
WHERE ROUTINE_SCHEMA = ?
ORDER BY ROUTINE_NAME ASC;
";
