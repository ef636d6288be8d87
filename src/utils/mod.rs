pub mod logging;
pub mod text;

pub use text::{clean_repeated_words, truncate_text};
