use schemectl_core::{NormalizedType, TypeCategory};

/// Maps a `pg_catalog.format_type` result to the differ's normalized type.
/// Sizes embedded in the native string (`varchar(255)`, `numeric(10,2)`) are
/// parsed out so cross-engine comparisons see dimensions, not raw text.
#[must_use]
pub fn normalize(native_type: &str) -> NormalizedType {
    let lower = native_type.to_ascii_lowercase();
    let base = lower.split('(').next().unwrap_or(&lower).trim();

    match base {
        "smallint" | "integer" | "int" | "int4" | "int2" | "bigint" | "int8" | "serial" | "bigserial" | "smallserial" => {
            NormalizedType::simple(TypeCategory::Integer)
        }
        "numeric" | "decimal" => parse_decimal(&lower).unwrap_or(NormalizedType::simple(TypeCategory::Decimal)),
        "real" | "double precision" | "float4" | "float8" | "float" => NormalizedType::simple(TypeCategory::Float),
        "boolean" | "bool" => NormalizedType::simple(TypeCategory::Boolean),
        "date" => NormalizedType::simple(TypeCategory::Date),
        "time" | "time without time zone" | "time with time zone" => NormalizedType::simple(TypeCategory::Time),
        "timestamp" | "timestamp without time zone" | "timestamp with time zone" | "timestamptz" => {
            NormalizedType::simple(TypeCategory::DateTime)
        }
        "character" | "char" | "bpchar" => parse_sized(&lower, TypeCategory::Char),
        "character varying" | "varchar" => parse_sized(&lower, TypeCategory::Varchar),
        "text" => NormalizedType::simple(TypeCategory::Text),
        "bytea" => NormalizedType::simple(TypeCategory::Binary),
        "uuid" => NormalizedType::simple(TypeCategory::Guid),
        _ => NormalizedType::simple(TypeCategory::Unknown),
    }
}

fn parse_sized(native_type: &str, category: TypeCategory) -> NormalizedType {
    extract_args(native_type)
        .first()
        .and_then(|a| a.parse::<u32>().ok())
        .map_or_else(|| NormalizedType::simple(category), |size| NormalizedType::sized(category, size))
}

fn parse_decimal(native_type: &str) -> Option<NormalizedType> {
    let args = extract_args(native_type);
    let precision = args.first()?.parse::<u32>().ok()?;
    let scale = args.get(1).and_then(|s| s.parse::<u32>().ok()).unwrap_or(0);
    Some(NormalizedType::decimal(precision, scale))
}

fn extract_args(native_type: &str) -> Vec<String> {
    let Some(start) = native_type.find('(') else { return Vec::new() };
    let Some(end) = native_type.rfind(')') else { return Vec::new() };
    native_type[start + 1..end].split(',').map(|s| s.trim().to_string()).collect()
}
