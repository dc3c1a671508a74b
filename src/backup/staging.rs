//! Collects the backup sources into the staging directory
//!
//! Layout of a staged backup:
//!
//! ```text
//! clawd_backup_<stamp>/
//!   RESTORE_NOTES.txt
//!   manifest.json          (written afterwards by the manifest step)
//!   memory/                <project>/memory
//!   root_md_files/         <project>/*.md
//!   clawd_scripts/         <project>/scripts/*
//!   openclaw_config/       selected files from the OpenClaw directory
//!   cursorapps_clawd/      the mirror directory, minus build output
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::run_log::RunLog;
use crate::config::BackupConfig;
use crate::error::{ClawError, ClawResult};
use crate::process;

pub const MEMORY_STAGE: &str = "memory";
pub const MARKDOWN_STAGE: &str = "root_md_files";
pub const SCRIPTS_STAGE: &str = "clawd_scripts";
pub const OPENCLAW_STAGE: &str = "openclaw_config";
pub const MIRROR_STAGE: &str = "cursorapps_clawd";
pub const RESTORE_NOTES_FILE: &str = "RESTORE_NOTES.txt";

/// Names left out of the mirror copy
pub const MIRROR_EXCLUDES: [&str; 3] = ["node_modules", "test-results", ".last-run.json"];

/// Items copied from the OpenClaw directory, relative to it
pub const OPENCLAW_ITEMS: [&str; 7] = [
    "openclaw.json",
    "skills",
    "modules",
    "round-robin-models.json",
    "workspace",
    "workspace-local-ops",
    "cron/jobs.json",
];

const MIRROR_SYNC_TOOL: &str = "rsync";

/// How the mirror directory was copied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorMethod {
    Rsync,
    Copy,
}

/// What ended up in the staging directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingReport {
    pub memory: bool,
    pub markdown_files: usize,
    pub scripts: bool,
    pub openclaw_items: Vec<String>,
    pub mirror: Option<MirrorMethod>,
}

/// Copies every configured source into one staging directory
pub struct Stager<'a> {
    config: &'a BackupConfig,
    staging_dir: PathBuf,
    log: &'a RunLog,
}

impl<'a> Stager<'a> {
    pub fn new(config: &'a BackupConfig, staging_dir: PathBuf, log: &'a RunLog) -> Self {
        Self {
            config,
            staging_dir,
            log,
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Run every staging step in order
    pub fn stage_all(&self) -> ClawResult<StagingReport> {
        self.log.log("Preparing backup staging area...")?;
        fs::create_dir_all(&self.staging_dir).map_err(|e| {
            ClawError::Io(format!(
                "Failed to create staging directory {}: {}",
                self.staging_dir.display(),
                e
            ))
        })?;
        self.write_restore_notes()?;

        Ok(StagingReport {
            memory: self.stage_memory()?,
            markdown_files: self.stage_markdown()?,
            scripts: self.stage_scripts()?,
            openclaw_items: self.stage_openclaw()?,
            mirror: self.stage_mirror(process::command_exists(MIRROR_SYNC_TOOL))?,
        })
    }

    fn write_restore_notes(&self) -> ClawResult<()> {
        let path = self.staging_dir.join(RESTORE_NOTES_FILE);
        fs::write(&path, restore_notes(self.config)).map_err(|e| {
            ClawError::Io(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    /// `<project>/memory` wholesale
    pub fn stage_memory(&self) -> ClawResult<bool> {
        let source = self.config.source_dir();
        if !source.is_dir() {
            return Ok(false);
        }
        copy_tree(&source, &self.staging_dir.join(MEMORY_STAGE))?;
        self.log.log("Staged memory directory.")?;
        Ok(true)
    }

    /// Regular `*.md` files directly in the project root
    ///
    /// A file that cannot be copied is skipped with a warning.
    pub fn stage_markdown(&self) -> ClawResult<usize> {
        let files = markdown_files(&self.config.project_dir);
        if files.is_empty() {
            return Ok(0);
        }

        let target = self.staging_dir.join(MARKDOWN_STAGE);
        fs::create_dir_all(&target)?;
        let mut copied = 0;
        for file in &files {
            let Some(name) = file.file_name() else {
                continue;
            };
            match copy_file(file, &target.join(name)) {
                Ok(()) => copied += 1,
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "skipped during staging")
                }
            }
        }

        self.log
            .log(format!("Staged {} .md files from project root.", copied))?;
        Ok(copied)
    }

    /// Non-hidden entries of `<project>/scripts`; failures are skipped
    pub fn stage_scripts(&self) -> ClawResult<bool> {
        let source = self.config.project_dir.join("scripts");
        if !source.is_dir() {
            return Ok(false);
        }

        let target = self.staging_dir.join(SCRIPTS_STAGE);
        fs::create_dir_all(&target)?;
        copy_visible_entries(&source, &target);

        self.log.log("Staged clawd/scripts.")?;
        Ok(true)
    }

    /// Selected OpenClaw files; `openclaw_config/` always exists afterwards
    pub fn stage_openclaw(&self) -> ClawResult<Vec<String>> {
        let target = self.staging_dir.join(OPENCLAW_STAGE);
        fs::create_dir_all(&target)?;

        let source = &self.config.openclaw_dir;
        if !source.is_dir() {
            return Ok(Vec::new());
        }

        let mut staged = Vec::new();
        for item in OPENCLAW_ITEMS {
            let from = source.join(item);
            let to = target.join(item);

            // Files must be files and folders folders, or the item is skipped.
            let wanted_dir = !item.ends_with(".json");
            let present = if wanted_dir { from.is_dir() } else { from.is_file() };
            if !present {
                continue;
            }

            if wanted_dir {
                copy_tree(&from, &to)?;
            } else {
                copy_file(&from, &to)?;
            }
            staged.push(item.to_string());
        }

        self.log.log("Staged ~/.openclaw custom config.")?;
        Ok(staged)
    }

    /// The mirror directory, without build output
    ///
    /// `rsync` failures are fatal; the in-process fallback is best-effort.
    pub fn stage_mirror(&self, use_rsync: bool) -> ClawResult<Option<MirrorMethod>> {
        let source = &self.config.mirror_dir;
        if !source.is_dir() {
            return Ok(None);
        }

        let target = self.staging_dir.join(MIRROR_STAGE);
        fs::create_dir_all(&target)?;

        let method = if use_rsync {
            process::run_checked(MIRROR_SYNC_TOOL, &rsync_args(source, &target))?;
            MirrorMethod::Rsync
        } else {
            copy_visible_entries(source, &target);
            for name in MIRROR_EXCLUDES {
                remove_quietly(&target.join(name));
            }
            MirrorMethod::Copy
        };

        self.log.log("Staged Dev/CursorApps/clawd.")?;
        Ok(Some(method))
    }
}

/// `rsync -a --exclude=... SRC/ DST/`
pub fn rsync_args(source: &Path, target: &Path) -> Vec<String> {
    let mut args = vec!["-a".to_string()];
    args.extend(MIRROR_EXCLUDES.iter().map(|name| format!("--exclude={}", name)));
    args.push(with_trailing_slash(source));
    args.push(with_trailing_slash(target));
    args
}

fn with_trailing_slash(path: &Path) -> String {
    let mut rendered = path.to_string_lossy().to_string();
    if !rendered.ends_with('/') {
        rendered.push('/');
    }
    rendered
}

fn restore_notes(config: &BackupConfig) -> String {
    format!(
        "ClawBackup restore notes\n\
         ========================\n\
         \n\
         Extract with: tar -xzf <archive>\n\
         \n\
         {memory}/           -> {project}/memory\n\
         {markdown}/    -> {project}/\n\
         {scripts}/    -> {project}/scripts\n\
         {openclaw}/  -> {openclaw_dir}\n\
         {mirror}/ -> {mirror_dir}\n\
         \n\
         manifest.json records the host and paths this backup was taken from.\n",
        memory = MEMORY_STAGE,
        markdown = MARKDOWN_STAGE,
        scripts = SCRIPTS_STAGE,
        openclaw = OPENCLAW_STAGE,
        mirror = MIRROR_STAGE,
        project = config.project_dir.display(),
        openclaw_dir = config.openclaw_dir.display(),
        mirror_dir = config.mirror_dir.display(),
    )
}

/// Regular `*.md` files directly inside `dir`, sorted by name
fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "md").unwrap_or(false))
        .collect();
    files.sort();
    files
}

/// Copy each non-hidden top-level entry, logging and skipping failures
fn copy_visible_entries(source: &Path, target: &Path) {
    let entries = match fs::read_dir(source) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(source = %source.display(), error = %e, "cannot list directory");
            return;
        }
    };

    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let from = entry.path();
        if let Err(e) = copy_entry(&from, &target.join(&name)) {
            tracing::warn!(path = %from.display(), error = %e, "skipped during staging");
        }
    }
}

/// Copy a file, directory or symlink to `target`
pub fn copy_entry(source: &Path, target: &Path) -> ClawResult<()> {
    let file_type = fs::symlink_metadata(source)?.file_type();
    if file_type.is_symlink() {
        copy_symlink(source, target)
    } else if file_type.is_dir() {
        copy_tree(source, target)
    } else {
        copy_file(source, target)
    }
}

/// Recursively copy `source` to `target`, recreating symlinks as links
pub fn copy_tree(source: &Path, target: &Path) -> ClawResult<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| {
            ClawError::Io(format!("Failed to walk {}: {}", source.display(), e))
        })?;

        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| ClawError::Io(e.to_string()))?;
        let destination = target.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&destination).map_err(|e| {
                ClawError::Io(format!("Failed to create {}: {}", destination.display(), e))
            })?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &destination)?;
        } else {
            copy_file(entry.path(), &destination)?;
        }
    }
    Ok(())
}

fn copy_file(source: &Path, target: &Path) -> ClawResult<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, target).map_err(|e| {
        ClawError::Io(format!(
            "Failed to copy {} to {}: {}",
            source.display(),
            target.display(),
            e
        ))
    })?;
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(source: &Path, target: &Path) -> ClawResult<()> {
    let link = fs::read_link(source)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    std::os::unix::fs::symlink(&link, target).map_err(|e| {
        ClawError::Io(format!("Failed to link {}: {}", target.display(), e))
    })
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, target: &Path) -> ClawResult<()> {
    if source.is_dir() {
        copy_tree(&fs::canonicalize(source)?, target)
    } else if source.is_file() {
        copy_file(source, target)
    } else {
        Ok(())
    }
}

fn remove_quietly(path: &Path) {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(_) => return,
    };
    if let Err(e) = result {
        tracing::warn!(path = %path.display(), error = %e, "could not remove excluded entry");
    }
}
