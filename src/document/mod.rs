mod builder;
mod fragment;

pub use builder::{CombinedDocument, CombinedDocumentBuilder, transformation_line};
pub use fragment::format_transformation;
