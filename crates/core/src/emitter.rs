use crate::model::SchemaChange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStatement {
    pub sql: String,
    pub rollback_sql: Option<String>,
    pub transactional: bool,
}

/// Per-provider SQL renderer. A pure function of `SchemaChange` + provider
/// syntax rules — no I/O, mirroring §4.5's "purely a function of change and
/// provider" requirement.
///
/// ```rust
/// use schemectl_core::{RenderedStatement, SchemaChange, SqlEmitter};
///
/// struct ExampleEmitter;
///
/// impl SqlEmitter for ExampleEmitter {
///     fn quote_ident(&self, name: &str) -> String {
///         format!("\"{name}\"")
///     }
///
///     fn render(&self, change: &SchemaChange) -> RenderedStatement {
///         RenderedStatement {
///             sql: format!("-- {}", change.description),
///             rollback_sql: None,
///             transactional: true,
///         }
///     }
/// }
///
/// let emitter = ExampleEmitter;
/// assert_eq!(emitter.quote_ident("users"), "\"users\"");
/// ```
pub trait SqlEmitter {
    fn quote_ident(&self, name: &str) -> String;
    fn render(&self, change: &SchemaChange) -> RenderedStatement;

    fn render_batch(&self, changes: &[SchemaChange]) -> Vec<RenderedStatement> {
        changes.iter().map(|c| self.render(c)).collect()
    }
}

/// Concatenates rendered statements into one forward script and one rollback
/// script (`compiled-deployment.sql` / `rollback-script.sql`), in the order
/// given (callers pass plan order).
#[must_use]
pub fn compile_scripts(statements: &[RenderedStatement]) -> (String, String) {
    let mut forward = String::new();
    let mut rollback = String::new();

    for statement in statements {
        forward.push_str(&statement.sql);
        if !statement.sql.ends_with('\n') {
            forward.push('\n');
        }
    }

    for statement in statements.iter().rev() {
        if let Some(sql) = &statement.rollback_sql {
            rollback.push_str(sql);
            if !sql.ends_with('\n') {
                rollback.push('\n');
            }
        }
    }

    (forward, rollback)
}
