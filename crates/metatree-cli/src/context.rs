//! Shared command context and the CLI error type.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use anyhow::Context;
use metatree_config::TreeConfig;
use metatree_document::{Document, bencode};
use metatree_loader::{BencodeFileParser, DocumentParser, LoadAgent, LoadOptions};
use metatree_model::{BuildLimits, DocumentTree, NodeId, NodePresenter};
use tracing::info;

use crate::cli::OutputFormat;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Settings every command handler reads.
#[derive(Debug, Clone)]
pub(crate) struct AppContext {
    pub(crate) config: TreeConfig,
    pub(crate) output: OutputFormat,
}

/// A single source opened for inspection or editing.
#[derive(Debug)]
pub(crate) struct OpenedSource {
    pub(crate) path: PathBuf,
    pub(crate) tree: DocumentTree,
    pub(crate) node: NodeId,
    /// Document the subtree was built from, reused for unedited branches.
    pub(crate) base: Document,
}

impl AppContext {
    pub(crate) const fn presenter(&self) -> NodePresenter {
        NodePresenter::new(self.config.preview_bytes)
    }

    pub(crate) fn new_tree(&self) -> DocumentTree {
        DocumentTree::with_limits(BuildLimits {
            max_depth: self.config.max_depth,
        })
    }

    pub(crate) const fn parser(&self) -> BencodeFileParser {
        BencodeFileParser::new(self.config.max_source_bytes, self.config.max_depth)
    }

    pub(crate) fn agent(&self) -> LoadAgent {
        LoadAgent::new(self.parser()).with_options(LoadOptions {
            parse_concurrency: self.config.parse_concurrency,
            channel_capacity: self.config.channel_capacity,
        })
    }

    /// Parse `path` and attach it as the only source of a fresh tree.
    pub(crate) async fn open(&self, path: &Path) -> CliResult<OpenedSource> {
        let failed = || format!("failed to load {}", path.display());
        let base = self
            .parser()
            .parse(path)
            .await
            .with_context(failed)
            .map_err(CliError::failure)?;
        let mut tree = self.new_tree();
        let node = tree
            .add_root(path.to_string_lossy(), &base)
            .with_context(failed)
            .map_err(CliError::failure)?;
        Ok(OpenedSource {
            path: path.to_path_buf(),
            tree,
            node,
            base,
        })
    }
}

impl OpenedSource {
    /// Resolve `path` below the source node.
    pub(crate) fn resolve(&self, path: &str) -> CliResult<NodeId> {
        self.tree
            .resolve(self.node, path)
            .ok_or_else(|| CliError::validation(format!("path `{path}` does not exist")))
    }

    /// Re-encode the edited source and write it to `out`, or over the original
    /// file when `out` is `None`.
    pub(crate) async fn write_back(&self, out: Option<&Path>) -> CliResult<PathBuf> {
        let document = self
            .tree
            .serialize_with_base(self.node, &self.base)
            .map_err(CliError::failure)?;
        let bytes = bencode::encode(&document);
        let target = out.unwrap_or(self.path.as_path());
        tokio::fs::write(target, &bytes)
            .await
            .with_context(|| format!("failed to write {}", target.display()))
            .map_err(CliError::failure)?;
        info!(path = %target.display(), bytes = bytes.len(), "source written");
        Ok(target.to_path_buf())
    }
}
