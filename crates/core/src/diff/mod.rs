mod compare;
mod compare_remaining;
mod cycle;
pub mod engine;
mod reserved_words;

pub use cycle::find_cycles;
pub use engine::{DiffConfig, DiffEngine};
