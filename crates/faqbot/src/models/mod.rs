pub mod document;
pub mod faq_source;
pub mod filter;

pub use document::{Document, DocumentContent, DocumentType, FaqContent, NewDocument, SearchHit};
pub use faq_source::{load_faq_source, FaqRecord, FaqSource};
pub use filter::Filter;
