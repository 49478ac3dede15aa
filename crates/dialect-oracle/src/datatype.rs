use schemectl_core::{NormalizedType, TypeCategory};

/// Maps an `ALL_TAB_COLUMNS.data_type` name to the differ's normalized type.
/// Oracle reports length/precision/scale in separate columns rather than
/// embedded in the type name, so the adapter attaches them via
/// `with_dimensions` after this call.
#[must_use]
pub fn normalize(data_type: &str) -> NormalizedType {
    match data_type.to_ascii_uppercase().as_str() {
        "NUMBER" => NormalizedType::simple(TypeCategory::Decimal),
        "FLOAT" | "BINARY_FLOAT" | "BINARY_DOUBLE" => NormalizedType::simple(TypeCategory::Float),
        "DATE" => NormalizedType::simple(TypeCategory::DateTime),
        t if t.starts_with("TIMESTAMP") => NormalizedType::simple(TypeCategory::DateTime),
        "CHAR" | "NCHAR" => NormalizedType::simple(TypeCategory::Char),
        "VARCHAR2" | "NVARCHAR2" => NormalizedType::simple(TypeCategory::Varchar),
        "CLOB" | "NCLOB" | "LONG" => NormalizedType::simple(TypeCategory::Text),
        "BLOB" | "RAW" | "LONG RAW" | "BFILE" => NormalizedType::simple(TypeCategory::Binary),
        _ => NormalizedType::simple(TypeCategory::Unknown),
    }
}

/// Oracle's `NUMBER` has no inherent integer/decimal split: `NUMBER(p,0)` is
/// an integer in practice, `NUMBER` with no precision is unbounded decimal.
/// Applies catalog-reported `data_precision`/`data_scale`/`char_length`.
#[must_use]
pub fn with_dimensions(mut normalized: NormalizedType, data_precision: Option<u32>, data_scale: Option<u32>, char_length: Option<u32>) -> NormalizedType {
    if normalized.category == TypeCategory::Decimal {
        match data_scale {
            Some(0) | None => normalized.category = TypeCategory::Integer,
            Some(scale) => {
                normalized.precision = data_precision;
                normalized.scale = Some(scale);
            }
        }
    }
    if matches!(normalized.category, TypeCategory::Char | TypeCategory::Varchar) {
        normalized.size = char_length;
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_varchar2_with_char_length() {
        let t = with_dimensions(normalize("VARCHAR2"), None, None, Some(255));
        assert_eq!(t.category, TypeCategory::Varchar);
        assert_eq!(t.size, Some(255));
    }

    #[test]
    fn maps_number_with_scale_zero_as_integer() {
        let t = with_dimensions(normalize("NUMBER"), Some(10), Some(0), None);
        assert_eq!(t.category, TypeCategory::Integer);
    }

    #[test]
    fn maps_number_with_nonzero_scale_as_decimal() {
        let t = with_dimensions(normalize("NUMBER"), Some(10), Some(2), None);
        assert_eq!(t.category, TypeCategory::Decimal);
        assert_eq!(t.precision, Some(10));
        assert_eq!(t.scale, Some(2));
    }

    #[test]
    fn maps_unrecognized_type_to_unknown() {
        assert_eq!(normalize("XMLTYPE").category, TypeCategory::Unknown);
    }
}
