use ignore::{DirEntry, WalkBuilder};
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use crate::host::EDITORCONFIG_FILE;

/// Hidden entries are skipped, except `.editorconfig` files and the roots
/// given on the command line.
fn keep_entry(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    !name.starts_with('.') || name == EDITORCONFIG_FILE
}

/// Walk paths and yield each file once, respecting gitignore.
///
/// `.editorconfig` files found while walking are yielded too, so they are
/// treated like any other saved document.
pub fn walk_paths(paths: &[String]) -> impl Iterator<Item = io::Result<PathBuf>> {
    let mut seen = HashSet::new();
    let mut all_files = vec![];

    for path in paths {
        let walker = WalkBuilder::new(path)
            .hidden(false)
            .filter_entry(keep_entry)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(true)
            .build();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|ft| ft.is_file())
                        && seen.insert(entry.path().to_path_buf())
                    {
                        all_files.push(Ok(entry.into_path()));
                    }
                }
                Err(e) => {
                    all_files.push(Err(io::Error::other(e.to_string())));
                }
            }
        }
    }

    all_files.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn walk(dir: &TempDir) -> Vec<PathBuf> {
        let paths = vec![dir.path().to_string_lossy().to_string()];
        walk_paths(&paths).filter_map(|r| r.ok()).collect()
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        let mut names: Vec<_> = files
            .iter()
            .filter_map(|f| f.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    // ===========================================
    // File Walker
    // ===========================================

    #[test]
    fn test_walk_single_file() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("test.txt");
        fs::write(&file_path, "hello").unwrap();

        let paths = vec![file_path.to_string_lossy().to_string()];
        let files: Vec<_> = walk_paths(&paths).collect();

        assert_eq!(files.len(), 1);
        assert!(files[0].is_ok());
    }

    #[test]
    fn test_recursive_directory_traversal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("file1.txt"), "content1").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("subdir/file2.txt"), "content2").unwrap();

        assert_eq!(walk(&dir).len(), 2);
    }

    #[test]
    fn test_skip_hidden_files_but_keep_editorconfig() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("visible.txt"), "visible").unwrap();
        fs::write(dir.path().join(".hidden"), "hidden").unwrap();
        fs::write(dir.path().join(".editorconfig"), "root = true\n").unwrap();

        assert_eq!(names(&walk(&dir)), vec![".editorconfig", "visible.txt"]);
    }

    #[test]
    fn test_skip_hidden_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("file.txt"), "content").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/config"), "git config").unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join(".cache/.editorconfig"), "").unwrap();

        assert_eq!(names(&walk(&dir)), vec!["file.txt"]);
    }

    #[test]
    fn test_respect_gitignore() {
        let dir = TempDir::new().unwrap();

        // Create a .git directory so ignore crate respects .gitignore
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".gitignore"), "ignored.txt\n").unwrap();
        fs::write(dir.path().join("kept.txt"), "kept").unwrap();
        fs::write(dir.path().join("ignored.txt"), "ignored").unwrap();

        assert_eq!(names(&walk(&dir)), vec!["kept.txt"]);
    }

    #[test]
    fn test_file_given_twice_is_yielded_once() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("a.txt");
        fs::write(&file_path, "a").unwrap();

        let file = file_path.to_string_lossy().to_string();
        let files: Vec<_> = walk_paths(&[file.clone(), file]).collect();

        assert_eq!(files.len(), 1);
    }
}
