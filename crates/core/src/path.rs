//! Path context: explicit working-directory state for filesystem actions.
//!
//! Actions never touch the process-wide current directory. Every relative
//! path is resolved against the context's `cwd`, and `change_dir` only
//! moves the context. Resolution also blocks forbidden prefixes
//! (e.g. `~/.ssh`, `/etc`).

use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// The working-directory state threaded through every filesystem action.
#[derive(Debug, Clone)]
pub struct PathContext {
    root: PathBuf,
    cwd: PathBuf,
    forbidden: Vec<String>,
}

impl PathContext {
    /// Create a context rooted (and positioned) at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = normalize(&root.into());
        Self {
            cwd: root.clone(),
            root,
            forbidden: Vec::new(),
        }
    }

    /// Block every path under the given prefixes.
    pub fn with_forbidden(mut self, forbidden: Vec<String>) -> Self {
        self.forbidden = forbidden;
        self
    }

    /// The directory the run started in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The current working directory of the run.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Resolve a path argument against the current directory.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, PathError> {
        if path.trim().is_empty() {
            return Err(PathError::Empty);
        }

        let expanded = expand_tilde(path);
        let input = Path::new(&expanded);
        let joined = if input.is_absolute() {
            input.to_path_buf()
        } else {
            self.cwd.join(input)
        };
        let resolved = normalize(&joined);

        self.check_forbidden(path, &resolved)?;
        // Symlinks can point into forbidden trees, even for files not yet created
        if let Some(canonical) = canonicalize_existing(&resolved) {
            self.check_forbidden(path, &canonical)?;
        }

        Ok(resolved)
    }

    /// Move the working directory. The target must be an existing directory.
    pub fn change_dir(&mut self, path: &str) -> Result<&Path, PathError> {
        let target = self.resolve(path)?;
        if !target.exists() {
            return Err(PathError::NotFound { path: path.into() });
        }
        if !target.is_dir() {
            return Err(PathError::NotADirectory { path: path.into() });
        }
        self.cwd = target;
        Ok(&self.cwd)
    }

    fn check_forbidden(&self, original: &str, candidate: &Path) -> Result<(), PathError> {
        let candidate = lowercase(candidate);
        for pattern in &self.forbidden {
            let prefix = lowercase(&normalize(Path::new(&expand_tilde(pattern))));
            if candidate.starts_with(&prefix) {
                return Err(PathError::Forbidden {
                    path: original.into(),
                    pattern: pattern.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Canonicalize the nearest existing ancestor and re-attach the rest.
fn canonicalize_existing(path: &Path) -> Option<PathBuf> {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(canonical) = current.canonicalize() {
            return Some(missing.iter().rev().fold(canonical, |acc, part| acc.join(part)));
        }
        missing.push(current.file_name()?.to_os_string());
        current = current.parent()?;
    }
}

fn lowercase(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().replace('\\', "/").to_lowercase())
}

/// Expand ~ to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Some(home) = home_dir()
    {
        return path.replacen('~', &home, 1);
    }
    path.to_string()
}

fn home_dir() -> Option<String> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE").ok()
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_cwd() {
        let ctx = PathContext::new("/work/project");
        assert_eq!(ctx.resolve("src/main.rs").unwrap(), PathBuf::from("/work/project/src/main.rs"));
        assert_eq!(ctx.resolve(".").unwrap(), PathBuf::from("/work/project"));
        assert_eq!(ctx.resolve("../other").unwrap(), PathBuf::from("/work/other"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let ctx = PathContext::new("/work/project");
        assert_eq!(ctx.resolve("/tmp/x.txt").unwrap(), PathBuf::from("/tmp/x.txt"));
    }

    #[test]
    fn empty_path_rejected() {
        let ctx = PathContext::new("/work");
        assert!(matches!(ctx.resolve("  "), Err(PathError::Empty)));
    }

    #[test]
    fn forbidden_prefix_blocked() {
        let ctx = PathContext::new("/work").with_forbidden(vec!["/etc".into()]);
        match ctx.resolve("/etc/passwd") {
            Err(PathError::Forbidden { pattern, .. }) => assert_eq!(pattern, "/etc"),
            other => panic!("Expected Forbidden, got: {other:?}"),
        }
        // Traversal out of the root into a forbidden tree is still caught
        let ctx = PathContext::new("/work/project").with_forbidden(vec!["/etc".into()]);
        assert!(ctx.resolve("../../etc/shadow").is_err());
        // Component-wise, not string, prefix
        assert!(ctx.resolve("/etcetera/file").is_ok());
    }

    #[test]
    fn parent_dir_at_root_cannot_escape_forbidden_check() {
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("/../etc/new")), PathBuf::from("/etc/new"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));

        let ctx = PathContext::new("/work").with_forbidden(vec!["/etc".into()]);
        assert!(matches!(
            ctx.resolve("/../etc/opsloop-new-file"),
            Err(PathError::Forbidden { .. })
        ));
        assert!(matches!(
            ctx.resolve("../../../../../etc/new.conf"),
            Err(PathError::Forbidden { .. })
        ));
        assert_eq!(ctx.resolve("../../..").unwrap(), PathBuf::from("/"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_parent_of_new_file_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().canonicalize().unwrap();
        std::fs::create_dir(base.join("secret")).unwrap();
        std::fs::create_dir(base.join("work")).unwrap();
        std::os::unix::fs::symlink(base.join("secret"), base.join("work/link")).unwrap();

        let forbidden = base.join("secret").to_string_lossy().into_owned();
        let ctx = PathContext::new(base.join("work")).with_forbidden(vec![forbidden]);
        assert!(matches!(
            ctx.resolve("link/nested/new.txt"),
            Err(PathError::Forbidden { .. })
        ));
        assert!(ctx.resolve("plain/new.txt").is_ok());
    }

    #[test]
    fn tilde_paths_are_expanded() {
        let Some(home) = home_dir() else { return };
        let ctx = PathContext::new("/work").with_forbidden(vec!["~/.ssh".into()]);
        assert!(matches!(ctx.resolve("~/.ssh/id_rsa"), Err(PathError::Forbidden { .. })));
        assert_eq!(
            ctx.resolve("~/notes.txt").unwrap(),
            Path::new(&home).join("notes.txt")
        );
    }

    #[test]
    fn forbidden_check_is_case_insensitive() {
        let ctx = PathContext::new("/work").with_forbidden(vec!["/etc".into()]);
        assert!(ctx.resolve("/ETC/passwd").is_err());
    }

    #[test]
    fn change_dir_moves_context_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("infra")).unwrap();
        let process_cwd = std::env::current_dir().unwrap();

        let mut ctx = PathContext::new(dir.path());
        ctx.change_dir("infra").unwrap();
        assert!(ctx.cwd().ends_with("infra"));
        assert_eq!(ctx.root(), normalize(dir.path()).as_path());
        assert_eq!(std::env::current_dir().unwrap(), process_cwd);
    }

    #[test]
    fn change_dir_requires_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), "x").unwrap();

        let mut ctx = PathContext::new(dir.path());
        assert!(matches!(ctx.change_dir("missing"), Err(PathError::NotFound { .. })));
        assert!(matches!(ctx.change_dir("file.txt"), Err(PathError::NotADirectory { .. })));
        assert_eq!(ctx.cwd(), ctx.root());
    }
}
