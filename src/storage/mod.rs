mod repository;

pub use repository::*;

/// SQL migration for the document table
pub const MIGRATION_001_DOCUMENTS: &str = include_str!("migrations/001_documents.sql");
