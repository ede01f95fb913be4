//! Checks that builds are started from the root of the right git checkout.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use git2::Repository;

/// An opened repository whose work tree root is the directory we were given.
pub struct SdkRepo {
    repo: Repository,
    root: PathBuf,
}

impl SdkRepo {
    /// Opens `path`, failing unless it is the top of a git work tree.
    pub fn open_root(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).context("not in a git repository")?;
        let workdir = repo
            .workdir()
            .context("repository has no work tree")?
            .canonicalize()
            .context("failed to resolve repository root")?;
        let root = path
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", path.display()))?;

        if workdir != root {
            bail!(
                "not at repository root (current: {}, root: {})",
                root.display(),
                workdir.display()
            );
        }
        Ok(Self { repo, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Repository name taken from the `origin` remote URL.
    pub fn origin_name(&self) -> Result<String> {
        let remote = self
            .repo
            .find_remote("origin")
            .context("failed to get remote origin URL")?;
        let url = remote.url().context("origin URL is not valid UTF-8")?;
        Ok(repo_name_from_url(url).to_string())
    }

    /// Fails unless `origin` names the `expected` repository.
    pub fn ensure_origin(&self, expected: &str) -> Result<()> {
        let found = self.origin_name()?;
        if found != expected {
            bail!("not in the {expected} repository (found: {found})");
        }
        Ok(())
    }
}

fn repo_name_from_url(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo(origin: Option<&str>) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();
        if let Some(url) = origin {
            repo.remote("origin", url).unwrap();
        }
        tmp
    }

    #[test]
    fn repo_name_parsing() {
        assert_eq!(repo_name_from_url("git@github.com:org/mrs-sdk-qt.git"), "mrs-sdk-qt");
        assert_eq!(repo_name_from_url("https://example.com/org/mrs-sdk-qt"), "mrs-sdk-qt");
        assert_eq!(repo_name_from_url("https://example.com/org/mrs-sdk-qt/"), "mrs-sdk-qt");
        assert_eq!(repo_name_from_url("git@host:mrs-sdk-qt.git"), "mrs-sdk-qt");
    }

    #[test]
    fn open_fails_outside_a_repo() {
        let tmp = TempDir::new().unwrap();
        let err = SdkRepo::open_root(tmp.path()).err().unwrap();
        assert!(err.to_string().contains("not in a git repository"));
    }

    #[test]
    fn open_fails_in_subdirectory() {
        let tmp = init_repo(None);
        let sub = tmp.path().join("lib");
        std::fs::create_dir(&sub).unwrap();
        let err = SdkRepo::open_root(&sub).err().unwrap();
        assert!(err.to_string().starts_with("not at repository root"), "{err}");
    }

    #[test]
    fn open_succeeds_at_root() {
        let tmp = init_repo(None);
        let repo = SdkRepo::open_root(tmp.path()).unwrap();
        assert_eq!(repo.root(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn origin_must_match() {
        let tmp = init_repo(Some("git@github.com:acme/mrs-sdk-qt.git"));
        let repo = SdkRepo::open_root(tmp.path()).unwrap();
        repo.ensure_origin("mrs-sdk-qt").unwrap();

        let err = repo.ensure_origin("other-sdk").unwrap_err();
        assert_eq!(
            err.to_string(),
            "not in the other-sdk repository (found: mrs-sdk-qt)"
        );
    }

    #[test]
    fn missing_origin_is_an_error() {
        let tmp = init_repo(None);
        let repo = SdkRepo::open_root(tmp.path()).unwrap();
        assert!(repo.ensure_origin("mrs-sdk-qt").is_err());
    }
}
