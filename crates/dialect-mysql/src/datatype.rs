use schemectl_core::{NormalizedType, TypeCategory};

/// Maps an `information_schema.columns.column_type` string to the differ's
/// normalized type. MySQL embeds size/precision/scale in the same string as
/// unsigned/zerofill flags (`int(10) unsigned`, `decimal(10,2)`), so those are
/// parsed out before the category match.
#[must_use]
pub fn normalize(native_type: &str) -> NormalizedType {
    let lower = native_type.to_ascii_lowercase();
    let base = lower.split('(').next().unwrap_or(&lower).trim();
    let base = base.split_whitespace().next().unwrap_or(base);

    match base {
        "tinyint" if lower.contains("(1)") => NormalizedType::simple(TypeCategory::Boolean),
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => {
            NormalizedType::simple(TypeCategory::Integer)
        }
        "decimal" | "numeric" => parse_decimal(&lower).unwrap_or(NormalizedType::simple(TypeCategory::Decimal)),
        "float" | "double" | "double precision" => NormalizedType::simple(TypeCategory::Float),
        "bit" if lower.contains("(1)") => NormalizedType::simple(TypeCategory::Boolean),
        "date" => NormalizedType::simple(TypeCategory::Date),
        "time" => NormalizedType::simple(TypeCategory::Time),
        "datetime" | "timestamp" => NormalizedType::simple(TypeCategory::DateTime),
        "char" => parse_sized(&lower, TypeCategory::Char),
        "varchar" => parse_sized(&lower, TypeCategory::Varchar),
        "text" | "tinytext" | "mediumtext" | "longtext" => NormalizedType::simple(TypeCategory::Text),
        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" => {
            NormalizedType::simple(TypeCategory::Binary)
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_varchar_with_size() {
        let t = normalize("varchar(255)");
        assert_eq!(t.category, TypeCategory::Varchar);
        assert_eq!(t.size, Some(255));
    }

    #[test]
    fn maps_decimal_with_precision_and_scale() {
        let t = normalize("decimal(10,2) unsigned");
        assert_eq!(t.category, TypeCategory::Decimal);
        assert_eq!(t.precision, Some(10));
        assert_eq!(t.scale, Some(2));
    }

    #[test]
    fn maps_tinyint_one_as_boolean() {
        assert_eq!(normalize("tinyint(1)").category, TypeCategory::Boolean);
        assert_eq!(normalize("bit(1)").category, TypeCategory::Boolean);
    }

    #[test]
    fn maps_unrecognized_type_to_unknown() {
        assert_eq!(normalize("geometry").category, TypeCategory::Unknown);
    }
}
