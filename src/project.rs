//! Project discovery and membership resolution for MSBuild project files.
//!
//! A changed file belongs to a project when a `.vcxproj` at the nearest
//! qualifying directory level declares it in an `ItemGroup`. The search walks
//! from the file's directory towards the repository root and stops at the
//! first level where some project file declares any items at all.

use crate::config::ProjectConventions;
use crate::vcs::repository_root;

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use tracing::debug;

/// A parsed project file and the normalized paths it declares
#[derive(Debug, Clone)]
pub struct ProjectFile {
    pub path: PathBuf,
    pub dir: PathBuf,
    pub members: HashSet<PathBuf>,
}

impl ProjectFile {
    /// Read and parse a project file from disk
    pub fn load(path: &Path, conventions: &ProjectConventions) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read project file {}", path.display()))?;
        Self::parse(path, &content, conventions)
    }

    /// Parse project XML that was read from `path`
    pub fn parse(path: &Path, xml: &str, conventions: &ProjectConventions) -> Result<Self> {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let items = declared_items(xml, &conventions.ignored_items)
            .with_context(|| format!("Malformed project file {}", path.display()))?;

        let mut members = HashSet::new();
        for item in items {
            if is_unexpanded(&item) {
                debug!(
                    "Skipping item {} in {}: needs MSBuild evaluation",
                    item,
                    path.display()
                );
                continue;
            }
            members.insert(normalize_path(&dir.join(item_path(&item))));
        }

        Ok(ProjectFile {
            path: path.to_path_buf(),
            dir,
            members,
        })
    }

    /// Whether this project declares the given absolute, normalized path
    pub fn declares(&self, file: &Path) -> bool {
        self.members.contains(file)
    }
}

/// Collect the raw `Include` entries of every item declared in an `ItemGroup`
///
/// Items whose element name is in `ignored` are left out. A document without a
/// `Project` root or with unclosed elements is rejected.
pub fn declared_items(xml: &str, ignored: &[String]) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut depth = 0usize;
    // Depth of the ItemGroup element we are currently inside, if any
    let mut item_group: Option<usize> = None;
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("XML error at byte {}", reader.buffer_position()))?;

        match event {
            Event::Start(element) => {
                check_root(&element, depth, &mut seen_root)?;
                if item_group == Some(depth) {
                    collect_item(&element, ignored, &mut items)?;
                }
                depth += 1;
                if item_group.is_none() && element.local_name().as_ref() == b"ItemGroup" {
                    item_group = Some(depth);
                }
            }
            Event::Empty(element) => {
                check_root(&element, depth, &mut seen_root)?;
                if item_group == Some(depth) {
                    collect_item(&element, ignored, &mut items)?;
                }
            }
            Event::End(_) => {
                if item_group == Some(depth) {
                    item_group = None;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        bail!("No root element found");
    }
    if depth != 0 {
        bail!("Unexpected end of file with {} unclosed element(s)", depth);
    }

    Ok(items)
}

fn check_root(element: &BytesStart<'_>, depth: usize, seen_root: &mut bool) -> Result<()> {
    if depth != 0 {
        return Ok(());
    }
    if *seen_root {
        bail!("Multiple root elements");
    }
    if element.local_name().as_ref() != b"Project" {
        bail!(
            "Root element is <{}>, expected <Project>",
            String::from_utf8_lossy(element.name().as_ref())
        );
    }
    *seen_root = true;
    Ok(())
}

fn collect_item(
    element: &BytesStart<'_>,
    ignored: &[String],
    items: &mut Vec<String>,
) -> Result<()> {
    let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
    if ignored.iter().any(|i| *i == name) {
        return Ok(());
    }

    let Some(include) = element.try_get_attribute("Include")? else {
        return Ok(());
    };
    let value = include.unescape_value()?;

    items.extend(
        value
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string),
    );
    Ok(())
}

/// Entries with property/item references or wildcards need MSBuild to expand
fn is_unexpanded(item: &str) -> bool {
    item.contains("$(") || item.contains("@(") || item.contains(['*', '?'])
}

/// Project files always use backslashes; map them to the native separator
fn item_path(item: &str) -> PathBuf {
    if MAIN_SEPARATOR == '\\' {
        PathBuf::from(item)
    } else {
        PathBuf::from(item.replace('\\', "/"))
    }
}

/// Lexically normalize a path: drop `.` components and collapse `..`
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Parse every project file directly inside `dir`, in sorted order
pub fn projects_in_dir(dir: &Path, conventions: &ProjectConventions) -> Result<Vec<ProjectFile>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        let is_project = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                conventions
                    .extensions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            });
        if is_project && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .iter()
        .map(|path| ProjectFile::load(path, conventions))
        .collect()
}

/// Find the project files at the first directory level, from the file's own
/// directory up to the repository root, where any project declares items
///
/// Returns an empty list when no such level exists.
pub fn find_declaring_level(
    file: &Path,
    conventions: &ProjectConventions,
) -> Result<Vec<ProjectFile>> {
    let Some(start) = file.parent() else {
        return Ok(Vec::new());
    };
    let root = repository_root(start);

    let mut current = Some(start);
    while let Some(dir) = current {
        let projects = projects_in_dir(dir, conventions)?;
        if projects.iter().any(|p| !p.members.is_empty()) {
            return Ok(projects);
        }

        if root.as_deref() == Some(dir) {
            break;
        }
        current = dir.parent();
    }

    Ok(Vec::new())
}

/// Whether an absolute, normalized file path is declared by a project at the
/// first qualifying level above it
pub fn is_in_project(file: &Path, conventions: &ProjectConventions) -> Result<bool> {
    let projects = find_declaring_level(file, conventions)?;
    let declaring = projects.iter().find(|p| p.declares(file));

    match declaring {
        Some(project) => {
            debug!("{} is declared by {}", file.display(), project.path.display());
            Ok(true)
        }
        None => {
            if let Some(first) = projects.first() {
                debug!(
                    "{} is not declared by any project in {}",
                    file.display(),
                    first.dir.display()
                );
            } else {
                debug!("No project file found for {}", file.display());
            }
            Ok(false)
        }
    }
}
