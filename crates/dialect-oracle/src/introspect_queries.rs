pub(crate) const SHOW_SERVER_VERSION: &str = "SELECT version FROM product_component_version WHERE rownum = 1";

pub(crate) const TABLE_NAMES: &str = "
SELECT table_name
FROM all_tables
WHERE owner = :1
ORDER BY table_name ASC
";

pub(crate) const TABLE_COLUMNS: &str = "
SELECT
  column_name,
  data_type,
  data_precision,
  data_scale,
  char_length,
  nullable,
  data_default
FROM all_tab_columns
WHERE owner = :1 AND table_name = :2
ORDER BY column_id ASC
";

pub(crate) const IDENTITY_COLUMNS: &str = "
SELECT column_name
FROM all_tab_identity_cols
WHERE owner = :1 AND table_name = :2
";

pub(crate) const TABLE_CONSTRAINTS: &str = "
SELECT
  c.constraint_name,
  c.constraint_type,
  LISTAGG(cc.column_name, ',') WITHIN GROUP (ORDER BY cc.position) AS columns,
  c.r_owner,
  rc.table_name AS r_table_name,
  c.delete_rule
FROM all_constraints c
INNER JOIN all_cons_columns cc ON cc.owner = c.owner AND cc.constraint_name = c.constraint_name
LEFT JOIN all_constraints rc ON rc.owner = c.r_owner AND rc.constraint_name = c.r_constraint_name
WHERE c.owner = :1 AND c.table_name = :2 AND c.constraint_type IN ('P', 'U', 'R', 'C')
GROUP BY c.constraint_name, c.constraint_type, c.r_owner, rc.table_name, c.delete_rule
ORDER BY c.constraint_name ASC
";

pub(crate) const FOREIGN_KEY_COLUMNS: &str = "
SELECT cc.column_name
FROM all_cons_columns cc
INNER JOIN all_constraints c ON c.owner = cc.owner AND c.constraint_name = cc.constraint_name
WHERE c.r_owner = :1 AND c.r_constraint_name = :2
ORDER BY cc.position ASC
";

pub(crate) const TABLE_INDEXES: &str = "
SELECT
  i.index_name,
  LISTAGG(ic.column_name, ',') WITHIN GROUP (ORDER BY ic.column_position) AS columns,
  i.uniqueness
FROM all_indexes i
INNER JOIN all_ind_columns ic ON ic.index_owner = i.owner AND ic.index_name = i.index_name
WHERE i.table_owner = :1 AND i.table_name = :2
  AND NOT EXISTS (
    SELECT 1 FROM all_constraints c
    WHERE c.owner = i.table_owner AND c.constraint_type = 'P' AND c.index_name = i.index_name
  )
GROUP BY i.index_name, i.uniqueness
ORDER BY i.index_name ASC
";

pub(crate) const VIEWS: &str = "
SELECT view_name, text
FROM all_views
WHERE owner = :1
ORDER BY view_name ASC
";

pub(crate) const PROCEDURES: &str = "
SELECT DISTINCT object_name
FROM all_procedures
WHERE owner = :1 AND object_type = 'PROCEDURE'
ORDER BY object_name ASC
";

pub(crate) const FUNCTIONS: &str = "
SELECT DISTINCT object_name
FROM all_procedures
WHERE owner = :1 AND object_type = 'FUNCTION'
ORDER BY object_name ASC
";

pub(crate) const SOURCE_TEXT: &str = "
SELECT text
FROM all_source
WHERE owner = :1 AND name = :2
ORDER BY line ASC
";
