/// A minimal, provider-agnostic reserved-word set used when a dialect crate
/// does not supply its own. Individual dialects are expected to pass their
/// own larger set through `DiffConfig::reserved_words`; this is the
/// fallback so `core` alone is still useful in tests.
pub const DEFAULT_RESERVED_WORDS: &[&str] = &[
    "select", "insert", "update", "delete", "table", "index", "view", "user", "order", "group",
    "primary", "key", "foreign", "references", "constraint", "column", "default", "null",
    "transaction", "grant", "revoke", "schema", "database",
];

#[must_use]
pub fn is_reserved(name: &str, reserved_words: &[String]) -> bool {
    reserved_words.iter().any(|w| w.eq_ignore_ascii_case(name))
}
