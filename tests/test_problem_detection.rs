use filetime::FileTime;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use tlogcheck::{Conventions, DetectedProblem, Detector};

const SOURCE_TIME: i64 = 1_700_000_000;

fn touch(path: &Path, unix_time: i64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
    filetime::set_file_mtime(path, FileTime::from_unix_time(unix_time, 0)).unwrap();
}

fn write_project(path: &Path, items: &[&str]) {
    let includes: String = items
        .iter()
        .map(|item| format!("    <ClCompile Include=\"{}\" />\n", item))
        .collect();
    let xml = format!("<Project>\n  <ItemGroup>\n{}  </ItemGroup>\n</Project>\n", includes);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, xml).unwrap();
}

/// Two projects in one repository:
///   app/app.vcxproj  declares main.c and util.c
///   lib/lib.vcxproj  declares src\lib.c (the project sits one level above the file)
fn setup_workspace() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join(".git")).unwrap();

    write_project(&root.join("app/app.vcxproj"), &["main.c", "util.c"]);
    touch(&root.join("app/main.c"), SOURCE_TIME);
    touch(&root.join("app/util.c"), SOURCE_TIME);

    write_project(&root.join("lib/lib.vcxproj"), &["src\\lib.c"]);
    touch(&root.join("lib/src/lib.c"), SOURCE_TIME);

    dir
}

fn check(root: &Path, files: &[&str], build_types: &[&str]) -> BTreeSet<DetectedProblem> {
    let conventions = Conventions::embedded().unwrap();
    let detector = Detector::new(&conventions, root);
    let files: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
    let build_types: Vec<String> = build_types.iter().map(|b| b.to_string()).collect();
    detector.check_files(&files, &build_types).unwrap()
}

#[test]
fn test_one_problem_per_project_for_many_files() {
    let dir = setup_workspace();
    let root = dir.path();
    touch(&root.join("app/Release/app.tlog/unsuccessfulbuild"), SOURCE_TIME);

    let problems = check(root, &["app/main.c", "app/util.c", "app/main.c"], &["Release"]);

    assert_eq!(problems.len(), 1);
    assert!(problems.contains(&DetectedProblem::unsuccessful("Release", "app")));
}

#[test]
fn test_outdated_per_build_type() {
    let dir = setup_workspace();
    let root = dir.path();
    touch(&root.join("app/Debug/app.tlog/app.lastbuildstate"), SOURCE_TIME - 1);
    touch(&root.join("app/Release/app.tlog/app.lastbuildstate"), SOURCE_TIME - 1);

    let problems = check(root, &["app/main.c"], &["Debug", "Release"]);

    let expected: BTreeSet<_> = [
        DetectedProblem::outdated("Debug", "app"),
        DetectedProblem::outdated("Release", "app"),
    ]
    .into_iter()
    .collect();
    assert_eq!(problems, expected);
}

#[test]
fn test_fresh_build_has_no_problem() {
    let dir = setup_workspace();
    let root = dir.path();
    touch(&root.join("app/Release/app.tlog/app.lastbuildstate"), SOURCE_TIME + 1);

    assert!(check(root, &["app/main.c"], &["Release"]).is_empty());
}

#[test]
fn test_project_declared_from_parent_directory() {
    let dir = setup_workspace();
    let root = dir.path();
    // Build logs are searched below the changed file's directory
    touch(&root.join("lib/src/Release/lib.tlog/unsuccessfulbuild"), SOURCE_TIME);

    let problems = check(root, &["lib/src/lib.c"], &["Release"]);
    assert_eq!(
        problems.into_iter().collect::<Vec<_>>(),
        vec![DetectedProblem::unsuccessful("Release", "lib")]
    );
}

#[test]
fn test_build_logs_beside_project_are_not_below_file() {
    let dir = setup_workspace();
    let root = dir.path();
    // lib/Release is a sibling of lib/src, not below it
    touch(&root.join("lib/Release/lib.tlog/unsuccessfulbuild"), SOURCE_TIME);

    assert!(check(root, &["lib/src/lib.c"], &["Release"]).is_empty());
}

#[test]
fn test_problems_from_several_projects() {
    let dir = setup_workspace();
    let root = dir.path();
    touch(&root.join("app/Release/app.tlog/unsuccessfulbuild"), SOURCE_TIME);
    touch(&root.join("lib/src/Release/lib.tlog/lib.lastbuildstate"), SOURCE_TIME - 1);

    let problems = check(root, &["app/main.c", "lib/src/lib.c"], &["Release"]);

    assert_eq!(problems.len(), 2);
    assert!(problems.contains(&DetectedProblem::unsuccessful("Release", "app")));
    assert!(problems.contains(&DetectedProblem::outdated("Release", "lib")));
}

#[test]
fn test_undeclared_file_is_skipped() {
    let dir = setup_workspace();
    let root = dir.path();
    touch(&root.join("app/extra.c"), SOURCE_TIME);
    touch(&root.join("app/Release/app.tlog/unsuccessfulbuild"), SOURCE_TIME);

    assert!(check(root, &["app/extra.c"], &["Release"]).is_empty());
}

#[test]
fn test_missing_file_is_skipped() {
    let dir = setup_workspace();
    let root = dir.path();
    touch(&root.join("app/Release/app.tlog/unsuccessfulbuild"), SOURCE_TIME);

    assert!(check(root, &["app/deleted.c"], &["Release"]).is_empty());
}

#[test]
fn test_path_below_regular_file_is_skipped() {
    let dir = setup_workspace();
    let root = dir.path();
    touch(&root.join("app/Release/app.tlog/unsuccessfulbuild"), SOURCE_TIME);

    assert!(check(root, &["app/main.c/other.c"], &["Release"]).is_empty());
}

#[test]
fn test_absolute_and_dotted_paths() {
    let dir = setup_workspace();
    let root = dir.path();
    touch(&root.join("app/Release/app.tlog/unsuccessfulbuild"), SOURCE_TIME);

    let absolute = root.join("app/main.c");
    let problems = check(
        root,
        &[absolute.to_str().unwrap(), "./lib/../app/util.c"],
        &["Release"],
    );
    assert_eq!(problems.len(), 1);
}

#[test]
fn test_unreadable_project_is_an_error() {
    let dir = setup_workspace();
    let root = dir.path();
    // Not valid UTF-8, so reading the project fails with InvalidData
    fs::write(root.join("app/app.vcxproj"), [0xff, 0xfe, 0x00, 0x3c]).unwrap();

    let conventions = Conventions::embedded().unwrap();
    let detector = Detector::new(&conventions, root);
    let err = detector
        .check_files(&[PathBuf::from("app/main.c")], &["Release".to_string()])
        .unwrap_err();

    assert!(format!("{:#}", err).contains("app.vcxproj"));
}

#[test]
fn test_malformed_project_is_an_error() {
    let dir = setup_workspace();
    let root = dir.path();
    fs::write(root.join("app/app.vcxproj"), "<Project><ItemGroup>").unwrap();

    let conventions = Conventions::embedded().unwrap();
    let detector = Detector::new(&conventions, root);
    let result = detector.check_files(&[PathBuf::from("app/main.c")], &["Release".to_string()]);

    assert!(result.is_err());
}
