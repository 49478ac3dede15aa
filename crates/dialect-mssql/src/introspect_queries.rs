pub(crate) const SHOW_SERVER_VERSION: &str = "SELECT CAST(SERVERPROPERTY('ProductVersion') AS nvarchar(128));";

pub(crate) const TABLE_NAMES: &str = "
SELECT t.name AS table_name
FROM sys.tables t
INNER JOIN sys.schemas s ON s.schema_id = t.schema_id
WHERE s.name = @P1
ORDER BY t.name ASC;
";

pub(crate) const TABLE_COLUMNS: &str = "
SELECT
  c.name AS column_name,
  ty.name AS data_type,
  c.max_length AS max_length,
  c.precision AS col_precision,
  c.scale AS col_scale,
  c.is_nullable AS nullable,
  c.is_identity AS identity,
  OBJECT_DEFINITION(c.default_object_id) AS default_expr
FROM sys.columns c
INNER JOIN sys.tables t ON t.object_id = c.object_id
INNER JOIN sys.schemas s ON s.schema_id = t.schema_id
INNER JOIN sys.types ty ON ty.user_type_id = c.user_type_id
WHERE s.name = @P1 AND t.name = @P2
ORDER BY c.column_id ASC;
";

pub(crate) const TABLE_CONSTRAINTS: &str = "
SELECT
  kc.name AS constraint_name,
  kc.type AS constraint_type,
  STRING_AGG(col.name, ',') WITHIN GROUP (ORDER BY ic.key_ordinal) AS columns
FROM sys.key_constraints kc
INNER JOIN sys.tables t ON t.object_id = kc.parent_object_id
INNER JOIN sys.schemas s ON s.schema_id = t.schema_id
INNER JOIN sys.index_columns ic ON ic.object_id = kc.parent_object_id AND ic.index_id = kc.unique_index_id
INNER JOIN sys.columns col ON col.object_id = ic.object_id AND col.column_id = ic.column_id
WHERE s.name = @P1 AND t.name = @P2
GROUP BY kc.name, kc.type
ORDER BY kc.name ASC;
";

pub(crate) const FOREIGN_KEYS: &str = "
SELECT
  fk.name AS constraint_name,
  STRING_AGG(pc.name, ',') WITHIN GROUP (ORDER BY fkc.constraint_column_id) AS columns,
  rs.name AS referenced_schema,
  rt.name AS referenced_table,
  STRING_AGG(rc.name, ',') WITHIN GROUP (ORDER BY fkc.constraint_column_id) AS referenced_columns,
  fk.delete_referential_action_desc AS on_delete,
  fk.update_referential_action_desc AS on_update
FROM sys.foreign_keys fk
INNER JOIN sys.tables t ON t.object_id = fk.parent_object_id
INNER JOIN sys.schemas s ON s.schema_id = t.schema_id
INNER JOIN sys.tables rt ON rt.object_id = fk.referenced_object_id
INNER JOIN sys.schemas rs ON rs.schema_id = rt.schema_id
INNER JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id
INNER JOIN sys.columns pc ON pc.object_id = fkc.parent_object_id AND pc.column_id = fkc.parent_column_id
INNER JOIN sys.columns rc ON rc.object_id = fkc.referenced_object_id AND rc.column_id = fkc.referenced_column_id
WHERE s.name = @P1 AND t.name = @P2
GROUP BY fk.name, rs.name, rt.name, fk.delete_referential_action_desc, fk.update_referential_action_desc
ORDER BY fk.name ASC;
";

pub(crate) const TABLE_INDEXES: &str = "
SELECT
  i.name AS index_name,
  STRING_AGG(c.name, ',') WITHIN GROUP (ORDER BY ic.key_ordinal) AS columns,
  i.is_unique AS is_unique,
  i.type_desc = 'CLUSTERED' AS is_clustered
FROM sys.indexes i
INNER JOIN sys.tables t ON t.object_id = i.object_id
INNER JOIN sys.schemas s ON s.schema_id = t.schema_id
INNER JOIN sys.index_columns ic ON ic.object_id = i.object_id AND ic.index_id = i.index_id
INNER JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
WHERE s.name = @P1 AND t.name = @P2 AND i.is_primary_key = 0 AND i.name IS NOT NULL
GROUP BY i.name, i.is_unique, i.type_desc
ORDER BY i.name ASC;
";

pub(crate) const VIEWS: &str = "
SELECT TABLE_NAME AS table_name, VIEW_DEFINITION AS view_definition
FROM INFORMATION_SCHEMA.VIEWS
WHERE TABLE_SCHEMA = @P1
ORDER BY TABLE_NAME ASC;
";

pub(crate) const ROUTINES: &str = "
SELECT ROUTINE_NAME AS routine_name, ROUTINE_TYPE AS routine_type, ROUTINE_DEFINITION AS routine_definition, DATA_TYPE AS data_type
FROM INFORMATION_SCHEMA.ROUTINES
WHERE ROUTINE_SCHEMA = @P1
ORDER BY ROUTINE_NAME ASC;
";
