//! node_modules relocation
//!
//! Establishes a single authoritative `node_modules` inside the layer
//! that will receive the install, reachable from the working directory
//! through symlinks. The steps are planned from the observed state by a
//! pure function and then applied to the filesystem.
//!
//! | Current layer | Working dir     | Steps                                  |
//! |---------------|-----------------|----------------------------------------|
//! | set           | any             | copy current → next, temp → current, work → temp |
//! | unset         | absent          | mkdir next, work → next                |
//! | unset         | real directory  | move work → next, work → next          |
//!
//! A symlink already sitting at `<work>/node_modules` is left over from
//! an earlier phase or build and is removed first.

use crate::error::{YarnInstallError, YarnInstallResult};
use crate::layer::NODE_MODULES;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Where a `node_modules` path lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleLocation {
    /// `<working_dir>/node_modules`, always a symlink once relocated
    WorkingDirectory(PathBuf),
    /// `<temp_dir>/node_modules`, an indirection symlink
    TemporaryIndirection(PathBuf),
    /// `<layer>/node_modules`, owns the real directory
    CacheLayer(PathBuf),
}

impl ModuleLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::WorkingDirectory(path)
            | Self::TemporaryIndirection(path)
            | Self::CacheLayer(path) => path,
        }
    }
}

/// What currently sits at `<working_dir>/node_modules`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingModules {
    Absent,
    /// Vendored modules checked in with the app
    Directory,
    /// Link left over from a previous phase
    Symlink,
}

/// A single filesystem operation of a relocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationStep {
    RemoveLink(ModuleLocation),
    /// Drop a vendored tree already held by a reused layer
    RemoveDir(ModuleLocation),
    Copy {
        from: ModuleLocation,
        to: ModuleLocation,
    },
    CreateDir(ModuleLocation),
    Move {
        from: ModuleLocation,
        to: ModuleLocation,
    },
    Symlink {
        link: ModuleLocation,
        target: ModuleLocation,
    },
}

/// Inputs to a relocation
#[derive(Debug, Clone, Copy)]
pub struct Relocation<'a> {
    pub working_dir: &'a Path,
    /// Layer populated by an earlier phase of this build, if any
    pub current_layer: Option<&'a Path>,
    /// Fresh layer that will receive the install
    pub next_layer: &'a Path,
    pub temp_dir: &'a Path,
}

impl Relocation<'_> {
    /// Compute the steps for the observed working directory state
    pub fn plan(&self, existing: ExistingModules) -> Vec<RelocationStep> {
        let working = ModuleLocation::WorkingDirectory(self.working_dir.join(NODE_MODULES));
        let next = ModuleLocation::CacheLayer(self.next_layer.join(NODE_MODULES));

        let mut steps = Vec::with_capacity(4);
        if existing == ExistingModules::Symlink {
            steps.push(RelocationStep::RemoveLink(working.clone()));
        }

        if let Some(current_layer) = self.current_layer {
            let current = ModuleLocation::CacheLayer(current_layer.join(NODE_MODULES));
            let temp = ModuleLocation::TemporaryIndirection(self.temp_dir.join(NODE_MODULES));

            steps.push(RelocationStep::Copy {
                from: current.clone(),
                to: next,
            });
            // The indirection points at the current layer, not the next one.
            steps.push(RelocationStep::Symlink {
                link: temp.clone(),
                target: current,
            });
            steps.push(RelocationStep::Symlink {
                link: working,
                target: temp,
            });
            return steps;
        }

        if existing == ExistingModules::Directory {
            steps.push(RelocationStep::Move {
                from: working.clone(),
                to: next.clone(),
            });
        } else {
            steps.push(RelocationStep::CreateDir(next.clone()));
        }
        steps.push(RelocationStep::Symlink {
            link: working,
            target: next,
        });
        steps
    }

    /// Inspect the working directory, plan, and apply.
    ///
    /// Returns the next layer path. Not safe to repeat with the same
    /// arguments: existing indirection links make the second call fail.
    pub fn run(&self) -> YarnInstallResult<PathBuf> {
        let existing = inspect(&self.working_dir.join(NODE_MODULES))?;
        debug!("Existing node_modules in working directory: {:?}", existing);

        for step in self.plan(existing) {
            apply(&step)?;
        }

        Ok(self.next_layer.to_path_buf())
    }
}

/// Point `<working_dir>/node_modules` at a layer reused from a
/// previous build, replacing any stale link.
///
/// A real directory there is vendored modules whose content already
/// lives in the layer under the same hash, so it is removed.
pub fn link_existing(working_dir: &Path, layer: &Path) -> YarnInstallResult<()> {
    let working = ModuleLocation::WorkingDirectory(working_dir.join(NODE_MODULES));
    match inspect(working.path())? {
        ExistingModules::Symlink => apply(&RelocationStep::RemoveLink(working.clone()))?,
        ExistingModules::Directory => apply(&RelocationStep::RemoveDir(working.clone()))?,
        ExistingModules::Absent => {}
    }
    apply(&RelocationStep::Symlink {
        link: working,
        target: ModuleLocation::CacheLayer(layer.join(NODE_MODULES)),
    })
}

/// Classify the entry at `path` without following links
pub fn inspect(path: &Path) -> YarnInstallResult<ExistingModules> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Ok(ExistingModules::Symlink),
        Ok(_) => Ok(ExistingModules::Directory),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ExistingModules::Absent),
        Err(e) => Err(YarnInstallError::ModulesStat {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Apply one step to the filesystem
pub fn apply(step: &RelocationStep) -> YarnInstallResult<()> {
    debug!("Relocation step: {:?}", step);

    match step {
        RelocationStep::RemoveLink(link) => {
            fs::remove_file(link.path()).map_err(|e| YarnInstallError::ModulesUnlink {
                path: link.path().to_path_buf(),
                source: e,
            })
        }
        RelocationStep::RemoveDir(dir) => {
            fs::remove_dir_all(dir.path()).map_err(|e| YarnInstallError::ModulesRemove {
                path: dir.path().to_path_buf(),
                source: e,
            })
        }
        RelocationStep::Copy { from, to } => {
            copy_tree(from.path(), to.path()).map_err(|e| YarnInstallError::ModulesCopy {
                from: from.path().to_path_buf(),
                to: to.path().to_path_buf(),
                source: e,
            })
        }
        RelocationStep::CreateDir(at) => {
            fs::create_dir_all(at.path()).map_err(|e| YarnInstallError::ModulesCreate {
                path: at.path().to_path_buf(),
                source: e,
            })
        }
        RelocationStep::Move { from, to } => {
            if let Some(parent) = to.path().parent() {
                fs::create_dir_all(parent).map_err(|e| YarnInstallError::ModulesCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            move_tree(from.path(), to.path()).map_err(|e| YarnInstallError::ModulesMove {
                to: to.path().to_path_buf(),
                source: e,
            })
        }
        RelocationStep::Symlink { link, target } => {
            if let Some(parent) = link.path().parent() {
                fs::create_dir_all(parent).map_err(|e| YarnInstallError::ModulesCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            symlink_dir(target.path(), link.path()).map_err(|e| {
                YarnInstallError::ModulesSymlink {
                    link: link.path().to_path_buf(),
                    target: target.path().to_path_buf(),
                    source: e,
                }
            })
        }
    }
}

/// Rename, falling back to copy + delete across filesystems
fn move_tree(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(
                "Rename {} failed ({}), copying instead",
                from.display(),
                rename_err
            );
            copy_tree(from, to)?;
            fs::remove_dir_all(from)
        }
    }
}

/// Recursively copy a directory, keeping symlinks and permissions
fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    let mut dirs = Vec::new();

    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let dest = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest)?;
            dirs.push((dest, entry.metadata().map_err(io::Error::other)?.permissions()));
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            symlink_any(&target, &dest, entry.path())?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }

    // Directory modes last, so read-only directories were still writable
    // while their children were copied.
    for (dir, permissions) in dirs.into_iter().rev() {
        fs::set_permissions(dir, permissions)?;
    }

    Ok(())
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn symlink_any(target: &Path, link: &Path, _original: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_any(target: &Path, link: &Path, original: &Path) -> io::Result<()> {
    if fs::metadata(original).map(|m| m.is_dir()).unwrap_or(false) {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}
