//This file is part of wcrev
//
//wcrev is free software: you can redistribute it and/or modify
//it under the terms of the GNU General Public License as published by
//the Free Software Foundation, either version 3 of the License, or
//(at your option) any later version.
//
//wcrev is distributed in the hope that it will be useful,
//but WITHOUT ANY WARRANTY; without even the implied warranty of
//MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//GNU General Public License for more details.
//
//You should have received a copy of the GNU General Public License
//along with wcrev.  If not, see <http://www.gnu.org/licenses/>.

use crate::errors::Error;
use crate::types::*;
use git2::{Oid, Repository, Sort, Status, StatusOptions as GitStatusOptions};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Something that can tell the revision state of a working copy
pub trait StatusProvider {
    /// Queries the status of the working copy (or the item in it) at `path`
    fn status(&self, path: &Path, opts: &StatusOptions) -> Result<StatusRecord, Error>;
}

/// Queries a git working copy via libgit2.
///
/// Git has no revision numbers, so revisions are the number of commits on the
/// first-parent chain up to (and including) a commit. There are no locks and
/// a clone is never mixed-revision.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct GitStatus;

/// Reads a pre-populated [StatusRecord] from a TOML or JSON file (picked by
/// the `.json` extension, everything else is parsed as TOML). Missing fields
/// default to zero/false/empty.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct StatusFile {
    pub path: PathBuf,
}

impl StatusFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> StatusFile {
        StatusFile { path: path.into() }
    }
}

impl StatusProvider for StatusFile {
    fn status(&self, _path: &Path, _opts: &StatusOptions) -> Result<StatusRecord, Error> {
        let content = fs::read_to_string(&self.path).map_err(|e| Error::Open {
            path: self.path.display().to_string(),
            err: e.to_string(),
        })?;

        let is_json = self
            .path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let status: StatusRecord = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };

        debug!("Status from {}: {:?}", self.path.display(), status);

        Ok(status)
    }
}

impl StatusProvider for GitStatus {
    fn status(&self, path: &Path, opts: &StatusOptions) -> Result<StatusRecord, Error> {
        let repo = Repository::discover(path).map_err(|e| {
            debug!("Failed to discover repository: {}", e);
            Error::NotWorkingCopy(path.display().to_string())
        })?;

        let workdir = repo
            .workdir()
            .ok_or_else(|| Error::NotWorkingCopy(path.display().to_string()))?;

        let rel_path = relative_path(workdir, path)?;

        debug!(
            "Discovered git repository at {}, querying '{}'",
            workdir.display(),
            rel_path.display()
        );

        if opts.include_folders {
            debug!("Git tracks no folder revisions, ignoring include_folders");
        }

        let mut status = StatusRecord {
            url: repo
                .find_remote("origin")
                .ok()
                .and_then(|remote| remote.url().map(String::from))
                .unwrap_or_default(),
            has_local_mods: has_local_mods(&repo, &rel_path, opts.include_externals)?,
            ..Default::default()
        };

        let head = match repo.head() {
            Ok(head) => head.peel_to_commit()?,
            Err(_) => {
                info!("No HEAD found, repository might be empty");
                status.is_versioned = is_tracked(&repo, &rel_path, None)?;
                return Ok(status);
            }
        };

        let chain = first_parent_chain(&repo, head.id())?;
        let head_rev = chain.len() as i64;

        status.min_revision = head_rev;
        status.max_revision = head_rev;
        status.is_versioned = is_tracked(&repo, &rel_path, Some(&head))?;

        if let Some(idx) = last_change(&repo, &chain, &rel_path)? {
            let commit = repo.find_commit(chain[idx])?;

            status.commit_revision = head_rev - idx as i64;
            status.commit_date = commit.time().seconds() * 1_000_000;

            debug!(
                "'{}' last changed in {} (revision {})",
                rel_path.display(),
                commit.id(),
                status.commit_revision
            );
        }

        Ok(status)
    }
}

fn relative_path(workdir: &Path, path: &Path) -> Result<PathBuf, Error> {
    let workdir = fs::canonicalize(workdir)?;
    let path = fs::canonicalize(path).map_err(|_| Error::NotFound(path.display().to_string()))?;

    path.strip_prefix(&workdir)
        .map(Path::to_path_buf)
        .map_err(|_| Error::NotWorkingCopy(path.display().to_string()))
}

/// The first-parent history of `head`, newest commit first
fn first_parent_chain(repo: &Repository, head: Oid) -> Result<Vec<Oid>, Error> {
    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL)?;
    walk.push(head)?;
    walk.simplify_first_parent()?;

    Ok(walk.collect::<Result<Vec<Oid>, git2::Error>>()?)
}

/// Index into `chain` of the newest commit that changed `rel_path`
fn last_change(repo: &Repository, chain: &[Oid], rel_path: &Path) -> Result<Option<usize>, Error> {
    if rel_path.as_os_str().is_empty() {
        return Ok(if chain.is_empty() { None } else { Some(0) });
    }

    let entry_id = |oid: Oid| -> Result<Option<Oid>, Error> {
        let tree = repo.find_commit(oid)?.tree()?;
        Ok(tree.get_path(rel_path).ok().map(|entry| entry.id()))
    };

    let mut current = match chain.first() {
        Some(oid) => entry_id(*oid)?,
        None => return Ok(None),
    };

    for (idx, window) in chain.windows(2).enumerate() {
        let parent = entry_id(window[1])?;
        if current.is_some() && current != parent {
            return Ok(Some(idx));
        }
        current = parent;
    }

    // The root commit added it
    Ok(current.map(|_| chain.len() - 1))
}

fn is_tracked(
    repo: &Repository,
    rel_path: &Path,
    head: Option<&git2::Commit>,
) -> Result<bool, Error> {
    if rel_path.as_os_str().is_empty() {
        return Ok(true);
    }

    if let Some(commit) = head {
        if commit.tree()?.get_path(rel_path).is_ok() {
            return Ok(true);
        }
    }

    Ok(repo.index()?.get_path(rel_path, 0).is_some())
}

fn has_local_mods(
    repo: &Repository,
    rel_path: &Path,
    include_submodules: bool,
) -> Result<bool, Error> {
    let mut status_options = GitStatusOptions::new();
    status_options
        .include_untracked(false)
        .include_ignored(false)
        .exclude_submodules(!include_submodules);

    if !rel_path.as_os_str().is_empty() {
        status_options.pathspec(rel_path);
    }

    let statuses = repo.statuses(Some(&mut status_options))?;

    let modified = statuses
        .iter()
        .filter(|entry| {
            entry.status() != Status::CURRENT && !entry.status().contains(Status::IGNORED)
        })
        .count();

    debug!("Found {} modified entries", modified);

    Ok(modified > 0)
}
