// ABOUTME: Dump transfer pipeline: statement tokenizing, export, and import
// ABOUTME: Exports the split/partition helpers and the two transfer operations

pub mod export;
pub mod import;
pub mod statement;

pub use export::export_dump;
pub use import::import_dump;
pub use statement::{partition_statements, split_statements};
