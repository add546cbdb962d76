//! Service layer.
//!
//! Services hold the migration logic and report progress through events,
//! leaving presentation to the CLI.

pub mod migration;

pub use migration::{
    FailedAttachment, MigrationConfig, MigrationError, MigrationEvent, MigrationReport,
    MigrationService, SkippedDocument,
};
