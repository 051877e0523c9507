//! MSBuild conventions loaded from msbuild.toml, optionally merged with a user file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use toml::Table;

// Embed the defaults directly in the binary at compile time
const MSBUILD_TOML: &str = include_str!("../msbuild.toml");

/// Naming conventions for project files, build logs and default build types
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Conventions {
    pub project: ProjectConventions,
    pub logs: LogConventions,
    pub check: CheckDefaults,
}

/// How project files are recognized and which of their items are ignored
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConventions {
    /// File extensions (without the dot) of project files, e.g. "vcxproj"
    pub extensions: Vec<String>,
    /// ItemGroup element names whose Include never names a source file
    pub ignored_items: Vec<String>,
}

/// Names of the build-log directory and the marker files inside it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConventions {
    pub suffix: String,
    pub failure_marker: String,
    pub state_extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckDefaults {
    pub build_types: Vec<String>,
}

impl Conventions {
    /// The built-in conventions
    pub fn embedded() -> Result<Self> {
        let conventions: Conventions =
            toml::from_str(MSBUILD_TOML).context("Failed to parse embedded msbuild.toml")?;
        conventions.validate()?;
        Ok(conventions)
    }

    /// Load the built-in conventions, merging the given file over them when present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Self::embedded(),
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_toml_str(&content)
                    .with_context(|| format!("Invalid config file {}", path.display()))
            }
        }
    }

    /// Merge a TOML document over the built-in conventions
    pub fn from_toml_str(overlay: &str) -> Result<Self> {
        let mut base: Table =
            toml::from_str(MSBUILD_TOML).context("Failed to parse embedded msbuild.toml")?;
        let overlay: Table = toml::from_str(overlay).context("Failed to parse TOML")?;
        merge_tables(&mut base, overlay);

        let conventions: Conventions = toml::Value::Table(base)
            .try_into()
            .context("Invalid MSBuild conventions")?;
        conventions.validate()?;
        Ok(conventions)
    }

    /// Reject values that would make every path match or never match
    pub fn validate(&self) -> Result<()> {
        if self.project.extensions.is_empty() {
            bail!("project.extensions must list at least one extension");
        }
        if self.check.build_types.is_empty() {
            bail!("check.build_types must list at least one build type");
        }

        let values = self
            .project
            .extensions
            .iter()
            .map(|v| ("project.extensions", v))
            .chain(self.project.ignored_items.iter().map(|v| ("project.ignored_items", v)))
            .chain(self.check.build_types.iter().map(|v| ("check.build_types", v)))
            .chain([
                ("logs.suffix", &self.logs.suffix),
                ("logs.failure_marker", &self.logs.failure_marker),
                ("logs.state_extension", &self.logs.state_extension),
            ]);
        for (key, value) in values {
            if value.trim().is_empty() {
                bail!("{} must not contain empty values", key);
            }
            if value.contains(['/', '\\']) {
                bail!("{} must not contain path separators, got: {}", key, value);
            }
        }

        for (key, value) in [
            ("logs.suffix", &self.logs.suffix),
            ("logs.state_extension", &self.logs.state_extension),
        ] {
            if value.contains('.') {
                bail!("{} must be given without a dot, got: {}", key, value);
            }
        }

        Ok(())
    }
}

/// Deep-merge `overlay` into `base`: tables merge key by key, everything else replaces
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}
