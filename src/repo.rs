use anyhow::{anyhow, Result};
use git2::Repository;
use std::path::Path;
use tracing::debug;

/// Repository identifier and branch of a local checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRepository {
    pub url: String,
    pub branch: Option<String>,
}

/// Reads the `origin` remote (or the first remote) and the checked-out
/// branch of the Git repository containing `path`.
pub fn discover(path: &Path) -> Result<LocalRepository> {
    let repo = Repository::discover(path)
        .map_err(|e| anyhow!("no Git repository at {}: {}", path.display(), e.message()))?;

    let remote = match repo.find_remote("origin") {
        Ok(remote) => remote,
        Err(_) => {
            let names = repo.remotes()?;
            let first = names
                .iter()
                .flatten()
                .next()
                .ok_or_else(|| anyhow!("repository at {} has no remotes", path.display()))?
                .to_string();
            repo.find_remote(&first)?
        }
    };
    let url = remote
        .url()
        .ok_or_else(|| anyhow!("remote URL is not valid UTF-8"))?
        .to_string();

    // detached HEAD or an unborn branch leaves the choice to the service
    let branch = repo
        .head()
        .ok()
        .filter(|head| head.is_branch())
        .and_then(|head| head.shorthand().map(str::to_string));

    debug!("discovered {} on {:?}", url, branch);
    Ok(LocalRepository { url, branch })
}
