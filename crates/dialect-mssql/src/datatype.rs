use schemectl_core::{NormalizedType, TypeCategory};

/// Maps a `sys.types.name` system type name to the differ's normalized
/// type. Size/precision/scale travel separately in SQL Server's catalog
/// (`sys.columns.max_length`/`precision`/`scale`), so the adapter attaches
/// them after this call rather than parsing them out of the name.
#[must_use]
pub fn normalize(system_type_name: &str) -> NormalizedType {
    match system_type_name.to_ascii_lowercase().as_str() {
        "tinyint" | "smallint" | "int" | "bigint" => NormalizedType::simple(TypeCategory::Integer),
        "decimal" | "numeric" | "money" | "smallmoney" => NormalizedType::simple(TypeCategory::Decimal),
        "real" | "float" => NormalizedType::simple(TypeCategory::Float),
        "bit" => NormalizedType::simple(TypeCategory::Boolean),
        "date" => NormalizedType::simple(TypeCategory::Date),
        "time" => NormalizedType::simple(TypeCategory::Time),
        "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" => NormalizedType::simple(TypeCategory::DateTime),
        "char" | "nchar" => NormalizedType::simple(TypeCategory::Char),
        "varchar" | "nvarchar" => NormalizedType::simple(TypeCategory::Varchar),
        "text" | "ntext" | "xml" => NormalizedType::simple(TypeCategory::Text),
        "binary" | "varbinary" | "image" => NormalizedType::simple(TypeCategory::Binary),
        "uniqueidentifier" => NormalizedType::simple(TypeCategory::Guid),
        _ => NormalizedType::simple(TypeCategory::Unknown),
    }
}

/// Applies catalog-reported size/precision/scale onto a normalized type.
/// `max_length` is in bytes for `nvarchar`/`nchar` (2 bytes/char) and `-1`
/// signals `(max)`, which carries no comparable size.
#[must_use]
pub fn with_dimensions(mut normalized: NormalizedType, system_type_name: &str, max_length: i16, precision: u8, scale: u8) -> NormalizedType {
    let lower = system_type_name.to_ascii_lowercase();
    match normalized.category {
        TypeCategory::Varchar | TypeCategory::Char if max_length >= 0 => {
            let char_width = if lower.starts_with('n') { 2 } else { 1 };
            normalized.size = Some(u32::from(max_length.unsigned_abs()) / char_width);
        }
        TypeCategory::Decimal => {
            normalized.precision = Some(u32::from(precision));
            normalized.scale = Some(u32::from(scale));
        }
        _ => {}
    }
    normalized
}
