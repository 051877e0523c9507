//! Detection of failed and outdated builds for a set of changed files.

use crate::buildlog::{BuildLogLocator, MarkerKind};
use crate::config::Conventions;
use crate::project::{is_in_project, normalize_path};
use crate::time::{format_timestamp, is_outdated, modified_time};

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// A single problem, identified by all four fields
///
/// Two detections with the same build type, project and flags are the same
/// problem no matter which changed file led to them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DetectedProblem {
    pub build_type: String,
    pub project: String,
    /// False when the last build of the project did not succeed
    pub build: bool,
    /// True when the last successful build is not newer than a changed file
    pub outdated: bool,
}

impl DetectedProblem {
    pub fn unsuccessful(build_type: &str, project: &str) -> Self {
        DetectedProblem {
            build_type: build_type.to_string(),
            project: project.to_string(),
            build: false,
            outdated: false,
        }
    }

    pub fn outdated(build_type: &str, project: &str) -> Self {
        DetectedProblem {
            build_type: build_type.to_string(),
            project: project.to_string(),
            build: true,
            outdated: true,
        }
    }

    /// One line per flag that makes this a problem
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if !self.build {
            messages.push(format!(
                "Unsuccessful build for {} in {}.",
                self.build_type, self.project
            ));
        }
        if self.outdated {
            messages.push(format!(
                "Build for {} in {} is older than the file.",
                self.build_type, self.project
            ));
        }
        messages
    }
}

/// Compares changed files against the build logs of their projects
pub struct Detector<'a> {
    conventions: &'a Conventions,
    /// Directory that relative changed-file paths are resolved against
    base_dir: PathBuf,
}

impl<'a> Detector<'a> {
    pub fn new(conventions: &'a Conventions, base_dir: &Path) -> Self {
        Detector {
            conventions,
            base_dir: base_dir.to_path_buf(),
        }
    }

    /// Check every changed file for every build type and collect the unique problems
    pub fn check_files(
        &self,
        files: &[PathBuf],
        build_types: &[String],
    ) -> Result<BTreeSet<DetectedProblem>> {
        let mut problems = BTreeSet::new();
        for file in files {
            self.check_file(file, build_types, &mut problems)?;
        }
        Ok(problems)
    }

    /// Add the problems caused by one changed file to `problems`
    ///
    /// Missing files and files outside any project contribute nothing.
    pub fn check_file(
        &self,
        file: &Path,
        build_types: &[String],
        problems: &mut BTreeSet<DetectedProblem>,
    ) -> Result<()> {
        let path = normalize_path(&self.base_dir.join(file));

        let Some(file_time) = modified_time(&path)? else {
            debug!("Skipping {}: file does not exist", path.display());
            return Ok(());
        };
        if !is_in_project(&path, &self.conventions.project)? {
            debug!("Skipping {}: not part of any project", path.display());
            return Ok(());
        }
        let Some(search_root) = path.parent() else {
            return Ok(());
        };

        debug!(
            "Checking {} (modified {})",
            path.display(),
            format_timestamp(file_time)
        );
        for build_type in build_types {
            self.check_build_type(search_root, file_time, build_type, problems)?;
        }

        Ok(())
    }

    fn check_build_type(
        &self,
        search_root: &Path,
        file_time: SystemTime,
        build_type: &str,
        problems: &mut BTreeSet<DetectedProblem>,
    ) -> Result<()> {
        let locator = BuildLogLocator::new(&self.conventions.logs);
        let markers = locator.locate(search_root, build_type)?;

        if markers.is_empty() {
            debug!(
                "No build logs for {} below {}; not built yet",
                build_type,
                search_root.display()
            );
            return Ok(());
        }

        for marker in markers {
            match marker.kind {
                MarkerKind::Failure => {
                    debug!("Failure marker {}", marker.path.display());
                    problems.insert(DetectedProblem::unsuccessful(build_type, &marker.project));
                }
                MarkerKind::LastBuildState => {
                    // Removed since the walk saw it: nothing to compare against
                    let Some(build_time) = modified_time(&marker.path)? else {
                        continue;
                    };
                    debug!(
                        "Build state {} (modified {})",
                        marker.path.display(),
                        format_timestamp(build_time)
                    );
                    if is_outdated(build_time, file_time) {
                        problems.insert(DetectedProblem::outdated(build_type, &marker.project));
                    }
                }
            }
        }

        Ok(())
    }
}
