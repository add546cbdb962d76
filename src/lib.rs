//! legal-migrate - move legal document attachments out of Supabase Storage.
//!
//! Reads the case to folder mappings and the pending document records from
//! the Supabase REST API, downloads each attachment from Storage into the
//! local `Legal/` tree (`<case folder>/<year>/<MM Month year>/<n>. <title> (<date>).<ext>`)
//! and records the new location on the document row.

pub mod cli;
pub mod config;
pub mod layout;
pub mod models;
pub mod remote;
pub mod repository;
pub mod services;
pub mod utils;
