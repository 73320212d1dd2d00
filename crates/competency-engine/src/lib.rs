//! Template-driven competency evaluation for coach recruitment reviews.
//!
//! The [`competency`] module holds the engine: field schemas, grade tables, template
//! validation, and the extraction, matching, and aggregation pipeline. The remaining modules
//! carry the configuration, telemetry, and error plumbing shared with the preview service.

pub mod competency;
pub mod config;
pub mod error;
pub mod telemetry;
