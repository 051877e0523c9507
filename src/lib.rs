//! tlogcheck - MSBuild build freshness gate
//!
//! tlogcheck is meant to run as a pre-commit hook on the changed C/C++ files of a
//! commit. For every changed file that a `.vcxproj` declares, it looks below the
//! file's directory for the MSBuild build logs (`<project>.tlog`) of each requested
//! build type and reports:
//!
//! - an unsuccessful build when an `unsuccessfulbuild` marker is present
//! - an outdated build when `<project>.lastbuildstate` is not newer than the file
//!
//! The exit status is the number of unique problems, so a clean tree exits with 0.
//! A build type without any build logs counts as "not built yet" and is not a problem.

pub mod buildlog;
pub mod config;
pub mod detector;
pub mod logging;
pub mod project;
pub mod report;
pub mod time;
pub mod vcs;

// Re-export commonly used items
pub use buildlog::{BuildLogLocator, LogMarker, MarkerKind};
pub use config::Conventions;
pub use detector::{DetectedProblem, Detector};
pub use project::{find_declaring_level, is_in_project, ProjectFile};
pub use report::{exit_status, write_report, FATAL_STATUS};
pub use vcs::repository_root;
