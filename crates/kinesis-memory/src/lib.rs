//! `kinesis-memory` – Template storage.
//!
//! # Modules
//!
//! - [`database`] – [`TemplateDatabase`][database::TemplateDatabase]: the
//!   ordered in-memory collection of labelled reference gestures the
//!   recognizer matches against, plus the partial-tolerance bulk loader.
//! - [`store`] – the [`TemplateSource`][store::TemplateSource] /
//!   [`TemplateSink`][store::TemplateSink] contract and its
//!   [`DirectoryStore`][store::DirectoryStore] (JSON files) and
//!   [`MemoryStore`][store::MemoryStore] implementations.

pub mod database;
pub mod store;

pub use database::{LoadFailure, LoadReport, Template, TemplateDatabase, TemplateRecord};
pub use store::{DirectoryStore, MemoryStore, SourceEntry, StoreError, TemplateSink, TemplateSource};
