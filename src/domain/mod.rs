pub mod chapter;
pub mod vocabulary;

pub use chapter::Chapter;
pub use vocabulary::{VocabularyItem, WritingSystem};
