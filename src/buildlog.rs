//! Locating MSBuild build-log markers below a changed file.
//!
//! MSBuild writes one `<project>.tlog` directory per project into the
//! intermediate directory of each configuration, e.g.
//! `intermediate/Release/app.tlog/`. While a build runs it holds an
//! `unsuccessfulbuild` marker, which is removed when the build succeeds, and
//! `app.lastbuildstate` is touched at the end of every successful build.

use crate::config::LogConventions;
use crate::vcs::is_vcs_internal;

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Which marker a build-log file is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// The build is running or failed
    Failure,
    /// Touched when the last build finished successfully
    LastBuildState,
}

/// A marker file found inside a build-log directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMarker {
    pub kind: MarkerKind,
    pub path: PathBuf,
    /// Name of the build-log directory with its suffix stripped
    pub project: String,
}

pub struct BuildLogLocator<'a> {
    conventions: &'a LogConventions,
}

impl<'a> BuildLogLocator<'a> {
    pub fn new(conventions: &'a LogConventions) -> Self {
        BuildLogLocator { conventions }
    }

    /// Find every marker below `root` that sits in a build-log directory under
    /// a `build_type` directory, in path order
    ///
    /// Build output is usually ignored by VCS, so ignore files are not honoured.
    pub fn locate(&self, root: &Path, build_type: &str) -> Result<Vec<LogMarker>> {
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry
                        .file_name()
                        .to_str()
                        .is_some_and(is_vcs_internal)
            })
            .build();

        let mut markers = Vec::new();
        for entry in walker {
            let entry = entry
                .with_context(|| format!("Failed to walk build logs in {}", root.display()))?;

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if let Some(marker) = self.classify(root, entry.path(), build_type) {
                markers.push(marker);
            }
        }

        Ok(markers)
    }

    /// Classify a file found below `root`
    ///
    /// Only the components below `root` are matched, so a build-type name
    /// further up the tree never counts.
    pub fn classify(&self, root: &Path, path: &Path, build_type: &str) -> Option<LogMarker> {
        let relative = path.strip_prefix(root).ok()?;
        let components: Vec<&str> = relative
            .components()
            .map(|c| match c {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect::<Option<_>>()?;

        // <build-type>/.../<project>.<suffix>/<marker>
        let [parents @ .., log_dir, marker] = components.as_slice() else {
            return None;
        };
        if !parents.contains(&build_type) {
            return None;
        }

        let project = self.project_name(log_dir)?;
        let kind = self.marker_kind(marker)?;

        Some(LogMarker {
            kind,
            path: path.to_path_buf(),
            project: project.to_string(),
        })
    }

    /// `app.tlog` -> `app`; anything without the suffix is not a build-log directory
    fn project_name<'n>(&self, dir_name: &'n str) -> Option<&'n str> {
        let (stem, suffix) = dir_name.rsplit_once('.')?;
        if stem.is_empty() || !suffix.eq_ignore_ascii_case(&self.conventions.suffix) {
            return None;
        }
        Some(stem)
    }

    fn marker_kind(&self, file_name: &str) -> Option<MarkerKind> {
        if file_name.eq_ignore_ascii_case(&self.conventions.failure_marker) {
            return Some(MarkerKind::Failure);
        }

        let (stem, extension) = file_name.rsplit_once('.')?;
        if !stem.is_empty() && extension.eq_ignore_ascii_case(&self.conventions.state_extension) {
            return Some(MarkerKind::LastBuildState);
        }

        None
    }
}
