use serde::{Deserialize, Serialize};

/// Differ-internal normalized type. Every provider adapter parses its native
/// type string into this tuple at introspection time; parsing is total, so
/// an unrecognized native type string maps to `category = Unknown` rather
/// than failing introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeCategory {
    Integer,
    Decimal,
    Float,
    Boolean,
    Date,
    Time,
    DateTime,
    Char,
    Varchar,
    Text,
    Binary,
    Guid,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedType {
    pub category: TypeCategory,
    pub size: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

impl NormalizedType {
    #[must_use]
    pub fn simple(category: TypeCategory) -> Self {
        Self { category, size: None, precision: None, scale: None }
    }

    #[must_use]
    pub fn sized(category: TypeCategory, size: u32) -> Self {
        Self { category, size: Some(size), precision: None, scale: None }
    }

    #[must_use]
    pub fn decimal(precision: u32, scale: u32) -> Self {
        Self {
            category: TypeCategory::Decimal,
            size: None,
            precision: Some(precision),
            scale: Some(scale),
        }
    }

    /// True if any of (size, precision, scale) shrinks when moving from
    /// `self` (current) to `target`. Used to flag `potential_data_loss`
    /// within a single category.
    #[must_use]
    pub fn shrinks_into(&self, target: &Self) -> bool {
        let dim_shrinks = |old: Option<u32>, new: Option<u32>| matches!((old, new), (Some(o), Some(n)) if n < o);
        dim_shrinks(self.size, target.size)
            || dim_shrinks(self.precision, target.precision)
            || dim_shrinks(self.scale, target.scale)
    }
}

/// Cross-category compatibility verdict from the matrix in §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryCompatibility {
    Safe,
    Warning,
    Risky,
}

#[must_use]
pub fn category_compatibility(from: TypeCategory, to: TypeCategory) -> CategoryCompatibility {
    use TypeCategory::{Binary, Boolean, Char, Date, DateTime, Decimal, Float, Guid, Integer, Text, Time, Varchar};

    if from == to {
        return CategoryCompatibility::Safe;
    }

    match (from, to) {
        (Integer, Integer | Decimal | Float)
        | (Char, Varchar)
        | (Varchar, Text)
        | (Date, DateTime)
        | (Time, DateTime) => CategoryCompatibility::Safe,

        (Decimal, Integer)
        | (Float, Integer | Decimal)
        | (Varchar, Char)
        | (Text, Varchar)
        | (DateTime, Date | Time)
        | (Boolean, Integer) => CategoryCompatibility::Warning,

        (Text, Char) | (Binary, Text) | (Text, Binary) | (Guid, Text) | (Text, Guid) | (Integer, Boolean) => {
            CategoryCompatibility::Risky
        }

        _ => CategoryCompatibility::Risky,
    }
}
