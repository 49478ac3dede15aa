use schemectl_core::{NormalizedType, TypeCategory};

/// Maps a declared SQLite column type to the differ's normalized type,
/// following SQLite's type-affinity rules (the declared type is advisory;
/// only the substring matters): a type containing "INT" gets integer
/// affinity, "CHAR"/"CLOB"/"TEXT" gets text affinity, and so on. Sizes in
/// parentheses carry no storage meaning in SQLite but are still parsed so
/// differ comparisons treat `varchar(255)` and `varchar(100)` as distinct.
#[must_use]
pub fn normalize(native_type: &str) -> NormalizedType {
    let lower = native_type.to_ascii_lowercase();
    let base = lower.split('(').next().unwrap_or(&lower).trim();

    if base.is_empty() {
        return NormalizedType::simple(TypeCategory::Unknown);
    }
    if base.contains("int") {
        return NormalizedType::simple(TypeCategory::Integer);
    }
    if base.contains("bool") {
        return NormalizedType::simple(TypeCategory::Boolean);
    }
    if base == "date" {
        return NormalizedType::simple(TypeCategory::Date);
    }
    if base == "time" {
        return NormalizedType::simple(TypeCategory::Time);
    }
    if base.contains("datetime") || base.contains("timestamp") {
        return NormalizedType::simple(TypeCategory::DateTime);
    }
    if base.contains("varchar") || base.contains("character varying") {
        return parse_sized(&lower, TypeCategory::Varchar);
    }
    if base == "char" || base.contains("nchar") {
        return parse_sized(&lower, TypeCategory::Char);
    }
    if base.contains("clob") || base.contains("text") {
        return NormalizedType::simple(TypeCategory::Text);
    }
    if base.contains("blob") {
        return NormalizedType::simple(TypeCategory::Binary);
    }
    if base.contains("decimal") || base.contains("numeric") {
        return parse_decimal(&lower).unwrap_or(NormalizedType::simple(TypeCategory::Decimal));
    }
    if base.contains("real") || base.contains("floa") || base.contains("doub") {
        return NormalizedType::simple(TypeCategory::Float);
    }

    NormalizedType::simple(TypeCategory::Unknown)
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
        let t = normalize("VARCHAR(255)");
        assert_eq!(t.category, TypeCategory::Varchar);
        assert_eq!(t.size, Some(255));
    }

    #[test]
    fn maps_integer_affinity_by_substring() {
        assert_eq!(normalize("BIGINT").category, TypeCategory::Integer);
        assert_eq!(normalize("INT").category, TypeCategory::Integer);
    }

    #[test]
    fn maps_empty_declared_type_to_unknown() {
        assert_eq!(normalize("").category, TypeCategory::Unknown);
    }
}
