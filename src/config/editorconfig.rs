//! `.editorconfig` resolution from the filesystem.
//!
//! The engine only depends on [`ConfigResolver`]. [`EditorConfigResolver`] is
//! the default implementation: it reads every `.editorconfig` from the file's
//! directory upward until one declares `root = true`, then applies matching
//! sections from the outermost file inward so nearer files win.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use globset::{GlobBuilder, GlobMatcher};
use thiserror::Error;
use tracing::debug;

use crate::host::EDITORCONFIG_FILE;
use crate::properties::{IndentStyle, ResolvedConfig, INDENT_SIZE, TAB_WIDTH};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{} is not an absolute path", .0.display())]
    RelativePath(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid section [{pattern}] in {}: {source}", .path.display())]
    Glob {
        path: PathBuf,
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Produces the merged configuration for a file.
#[async_trait]
pub trait ConfigResolver: Send + Sync {
    async fn resolve(&self, path: &Path) -> Result<ResolvedConfig, ResolveError>;
}

/// One parsed `.editorconfig` file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EditorConfigFile {
    pub root: bool,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub pattern: String,
    pub properties: Vec<(String, String)>,
}

/// Parse `.editorconfig` content.
///
/// Keys are lowercased; values are trimmed but otherwise kept. Lines that are
/// neither section headers nor `key = value` pairs are ignored.
pub fn parse_editorconfig(content: &str) -> EditorConfigFile {
    let mut file = EditorConfigFile::default();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            file.sections.push(Section {
                pattern: line[1..line.len() - 1].to_string(),
                properties: Vec::new(),
            });
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim().to_string();

        match file.sections.last_mut() {
            Some(section) => section.properties.push((key, value)),
            None if key == "root" => file.root = value.eq_ignore_ascii_case("true"),
            None => {}
        }
    }

    file
}

/// Glob for a section pattern, relative to the directory of its file.
///
/// Patterns without a `/` match at any depth; a leading `/` anchors to the
/// directory.
fn section_glob(pattern: &str) -> String {
    if let Some(anchored) = pattern.strip_prefix('/') {
        anchored.to_string()
    } else if pattern.contains('/') {
        pattern.to_string()
    } else {
        format!("**/{pattern}")
    }
}

fn section_matcher(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    let glob = GlobBuilder::new(&section_glob(pattern))
        .literal_separator(true)
        .build()?;
    Ok(glob.compile_matcher())
}

impl EditorConfigFile {
    /// Apply the sections matching `relative` onto `config`, in file order.
    fn apply(
        &self,
        source: &Path,
        relative: &Path,
        config: &mut ResolvedConfig,
    ) -> Result<(), ResolveError> {
        let relative = relative.to_string_lossy().replace('\\', "/");

        for section in &self.sections {
            let matcher = section_matcher(&section.pattern).map_err(|source_err| {
                ResolveError::Glob {
                    path: source.to_path_buf(),
                    pattern: section.pattern.clone(),
                    source: source_err,
                }
            })?;
            if !matcher.is_match(relative.as_str()) {
                continue;
            }
            for (key, value) in &section.properties {
                config.set(key.as_str(), value.as_str());
            }
        }
        Ok(())
    }
}

/// Fill in the values the format derives from other properties.
fn apply_implied_properties(config: &mut ResolvedConfig) {
    if config.indent_style() == Some(IndentStyle::Tab) && !config.contains(INDENT_SIZE) {
        config.set(INDENT_SIZE, "tab");
    }

    if let Some(size) = config.indent_size() {
        if !config.contains(TAB_WIDTH) {
            config.set(TAB_WIDTH, size.to_string());
        }
    }
}

/// Reads `.editorconfig` files from disk.
#[derive(Debug, Clone, Default)]
pub struct EditorConfigResolver;

impl EditorConfigResolver {
    pub fn new() -> Self {
        Self
    }

    /// Configuration files applying to `path`, nearest first.
    async fn collect(&self, path: &Path) -> Result<Vec<(PathBuf, EditorConfigFile)>, ResolveError> {
        let mut files = Vec::new();
        let Some(parent) = path.parent() else {
            return Ok(files);
        };

        for dir in parent.ancestors() {
            let candidate = dir.join(EDITORCONFIG_FILE);
            let content = match tokio::fs::read_to_string(&candidate).await {
                Ok(content) => content,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(ResolveError::Io {
                        path: candidate,
                        source,
                    })
                }
            };

            let file = parse_editorconfig(&content);
            let root = file.root;
            files.push((candidate, file));
            if root {
                break;
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl ConfigResolver for EditorConfigResolver {
    async fn resolve(&self, path: &Path) -> Result<ResolvedConfig, ResolveError> {
        if !path.is_absolute() {
            return Err(ResolveError::RelativePath(path.to_path_buf()));
        }

        let files = self.collect(path).await?;
        let mut config = ResolvedConfig::new();

        for (source, file) in files.iter().rev() {
            let dir = source.parent().unwrap_or(Path::new("/"));
            let relative = path.strip_prefix(dir).unwrap_or(path);
            file.apply(source, relative, &mut config)?;
        }

        apply_implied_properties(&mut config);
        debug!(
            path = %path.display(),
            files = files.len(),
            properties = config.len(),
            "resolved editorconfig"
        );
        Ok(config)
    }
}
