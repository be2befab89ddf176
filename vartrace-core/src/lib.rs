//! # vartrace - variable usage tracing for physics suites
//!
//! Given a suite definition file and a variable's standard name, vartrace
//! reports which schemes in the suite's call tree declare the variable and
//! with which intent:
//!
//! - **Suite**: parses the suite definition and flattens it into a call tree
//! - **Metadata**: parses scheme `.meta` files and indexes them by scheme name
//! - **Tracer**: matches the standard name against every scheme's sections
//!
//! ## Example
//!
//! ```rust
//! use vartrace_core::{Intent, MetadataSection, SectionMatch, VariableMatcher, VariableRecord};
//!
//! let section = MetadataSection::new("scheme_a_run", "scheme")
//!     .with_variable(VariableRecord::new("ps", "surface_pressure").with_intent(Intent::In));
//!
//! let matcher = VariableMatcher::new("surface_pressure");
//! assert_eq!(
//!     matcher.scan_section(&section),
//!     SectionMatch::Exact { local_name: "ps".to_string(), intent: Some(Intent::In) }
//! );
//!
//! let matcher = VariableMatcher::new("pressure");
//! assert!(matches!(matcher.scan_section(&section), SectionMatch::Inexact { .. }));
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod metadata;
pub mod suite;
pub mod tracer;

// Re-export main types
pub use config::{PrebuildConfig, SchemeFiles, TrackConfig};
pub use driver::{run, TrackReport};
pub use error::{ErrorKind, Result, TrackError};
pub use metadata::{
    FileMetadataResolver, HostDefinition, HostVariables, Intent, MetadataResolver,
    MetadataSection, MetadataTable, SchemeFileIndex, VariableRecord,
};
pub use suite::{Group, Subcycle, Suite};
pub use tracer::{
    trace, ExactHit, SchemeOutcome, SchemeUsage, SectionMatch, SectionUsage, UsageRecord,
    UsageTracer, VariableMatch, VariableMatcher,
};
