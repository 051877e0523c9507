//! Repository root detection for Git and Jujutsu.

use std::path::{Path, PathBuf};

/// VCS internal directories that are never traversed while looking for build logs.
pub const VCS_INTERNALS: &[&str] = &[
    ".git", ".jj", ".svn", ".hg", ".bzr", "_darcs", ".pijul", "CVS", ".fossil",
];

/// The directory where the upward project search stops, if the path is inside a repository
///
/// Walks up to the nearest directory holding `.jj` or `.git`.
pub fn repository_root(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|ancestor| ancestor.join(".jj").exists() || ancestor.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Whether a directory name is a VCS internal directory
pub fn is_vcs_internal(name: &str) -> bool {
    VCS_INTERNALS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_detect_git_root() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("src/module");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(repository_root(&nested).as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_detect_jujutsu_root() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".jj")).unwrap();
        let nested = dir.path().join("src");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(repository_root(&nested).as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_nearest_root_wins() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let submodule = dir.path().join("vendor/lib");
        fs::create_dir_all(submodule.join(".git")).unwrap();

        assert_eq!(repository_root(&submodule).as_deref(), Some(submodule.as_path()));
    }

    #[test]
    fn test_vcs_internals() {
        assert!(is_vcs_internal(".git"));
        assert!(is_vcs_internal(".jj"));
        assert!(!is_vcs_internal("Release"));
    }
}
