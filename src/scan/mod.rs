use anyhow::{Context, Result};
use fs_err as fs;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::ScanConfig;

/// Point-in-time view of a project tree. Paths are relative to `root`,
/// `/`-separated, and each file lands in exactly one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStructure {
    pub root: String,
    pub source_files: Vec<String>,
    pub config_files: Vec<String>,
    pub other_files: Vec<String>,
    pub directories: Vec<String>,
}

impl ProjectStructure {
    pub fn file_count(&self) -> usize {
        self.source_files.len() + self.config_files.len() + self.other_files.len()
    }
}

fn has_ext(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy())
        .map(|e| exts.iter().any(|x| x.trim_start_matches('.').eq_ignore_ascii_case(&e)))
        .unwrap_or(false)
}

fn rel_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Walk `root`. A missing root gives an empty structure.
pub fn scan_project(root: &Path, cfg: &ScanConfig) -> Result<ProjectStructure> {
    let mut out = ProjectStructure { root: root.display().to_string(), ..Default::default() };
    if !root.exists() {
        debug!(root = %root.display(), "scan root does not exist");
        return Ok(out);
    }

    let ignore: Vec<Pattern> = cfg
        .ignore
        .iter()
        .map(|g| Pattern::new(g).with_context(|| format!("bad ignore glob {g}")))
        .collect::<Result<_>>()?;

    let walker = WalkDir::new(root).min_depth(1).sort_by_file_name().into_iter();
    // Ignore globs match entry names; a matching directory prunes its subtree.
    for entry in walker.filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        e.depth() == 0 || !ignore.iter().any(|p| p.matches(&name))
    }) {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        let rel = rel_string(entry.path().strip_prefix(root).unwrap_or(entry.path()));
        if entry.file_type().is_dir() {
            out.directories.push(rel);
        } else if has_ext(entry.path(), &cfg.source_extensions) {
            out.source_files.push(rel);
        } else if has_ext(entry.path(), &cfg.config_extensions) {
            out.config_files.push(rel);
        } else {
            out.other_files.push(rel);
        }
    }
    Ok(out)
}

/// Sorted, de-duplicated `import` targets across all source files.
/// Unreadable files are skipped.
pub fn collect_imports(root: &Path, structure: &ProjectStructure) -> Vec<String> {
    let mut imports = BTreeSet::new();
    for rel in &structure.source_files {
        let Ok(file) = fs::File::open(root.join(rel)) else { continue };
        for line in BufReader::new(file).lines().map_while(|l| l.ok()) {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("import ") {
                imports.insert(rest.trim_end_matches(';').trim().to_string());
            }
        }
    }
    imports.into_iter().collect()
}
