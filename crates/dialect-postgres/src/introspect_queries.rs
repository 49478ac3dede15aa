pub(crate) const SHOW_SERVER_VERSION: &str = "SHOW server_version";

pub(crate) const TABLE_NAMES: &str = r"
SELECT n.nspname AS table_schema, c.relname AS table_name
FROM pg_catalog.pg_class c
INNER JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
ORDER BY c.relname ASC;
";

pub(crate) const TABLE_COLUMNS: &str = r"
SELECT
  a.attname AS column_name,
  pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
  NOT a.attnotnull AS nullable,
  a.attidentity <> '' AS identity,
  pg_catalog.pg_get_expr(ad.adbin, ad.adrelid) AS default_expr
FROM pg_catalog.pg_attribute a
INNER JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
INNER JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = a.attrelid AND ad.adnum = a.attnum
WHERE n.nspname = $1 AND c.relname = $2
  AND a.attnum > 0 AND NOT a.attisdropped
ORDER BY a.attnum ASC;
";

pub(crate) const TABLE_CONSTRAINTS: &str = r"
SELECT
  con.conname AS constraint_name,
  con.contype::text AS constraint_type,
  array(
    SELECT a.attname FROM pg_catalog.pg_attribute a
    WHERE a.attrelid = con.conrelid AND a.attnum = ANY(con.conkey)
  ) AS columns,
  fn.nspname AS referenced_schema,
  fc.relname AS referenced_table,
  array(
    SELECT a.attname FROM pg_catalog.pg_attribute a
    WHERE a.attrelid = con.confrelid AND a.attnum = ANY(con.confkey)
  ) AS referenced_columns,
  con.confdeltype::text AS on_delete,
  con.confupdtype::text AS on_update,
  pg_catalog.pg_get_constraintdef(con.oid) AS definition
FROM pg_catalog.pg_constraint con
INNER JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
INNER JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
LEFT JOIN pg_catalog.pg_class fc ON fc.oid = con.confrelid
LEFT JOIN pg_catalog.pg_namespace fn ON fc.relnamespace = fn.oid
WHERE n.nspname = $1 AND c.relname = $2
ORDER BY con.conname ASC;
";

pub(crate) const TABLE_INDEXES: &str = r"
SELECT
  i.relname AS index_name,
  array(
    SELECT a.attname FROM pg_catalog.pg_attribute a
    WHERE a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
  ) AS columns,
  ix.indisunique AS is_unique,
  am.amname = 'btree' AND ix.indisclustered AS is_clustered
FROM pg_catalog.pg_index ix
INNER JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
INNER JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid
INNER JOIN pg_catalog.pg_namespace n ON t.relnamespace = n.oid
INNER JOIN pg_catalog.pg_am am ON i.relam = am.oid
WHERE n.nspname = $1 AND t.relname = $2 AND NOT ix.indisprimary
ORDER BY i.relname ASC;
";

pub(crate) const VIEWS: &str = r"
SELECT table_name, view_definition
FROM information_schema.views
WHERE table_schema = $1
ORDER BY table_name ASC;
";

pub(crate) const ROUTINES: &str = r"
SELECT routine_name, routine_type, routine_definition, data_type
FROM information_schema.routines
WHERE routine_schema = $1
ORDER BY routine_name ASC;
";
