//! Background load agent.
//!
//! A driver task keeps up to `parse_concurrency` parses in flight and forwards
//! their results over a bounded channel strictly in input order. Publication
//! into the tree happens on the caller's side of the channel, so the tree never
//! crosses threads.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use metatree_document::Document;
use metatree_model::{DocumentTree, NodeId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{LoadError, LoadResult};
use crate::parser::DocumentParser;

/// Tuning for a load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Number of sources parsed ahead of publication; `1` parses strictly one
    /// at a time.
    pub parse_concurrency: usize,
    /// Capacity of the result channel between driver and caller.
    pub channel_capacity: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            parse_concurrency: 1,
            channel_capacity: 16,
        }
    }
}

/// Result of parsing one source, delivered in input order.
#[derive(Debug)]
pub struct ParsedSource {
    /// Position in the input sequence.
    pub index: usize,
    /// Identifier the source is published under.
    pub source_id: String,
    /// Source path.
    pub path: PathBuf,
    /// Parsed document or the reason it could not be produced.
    pub result: LoadResult<Document>,
}

/// A source that became a subtree under Root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedSource {
    /// Position in the input sequence.
    pub index: usize,
    /// Identifier under Root.
    pub source_id: String,
    /// Handle of the new subtree.
    pub node: NodeId,
}

/// A source that was skipped.
#[derive(Debug)]
pub struct FailedSource {
    /// Position in the input sequence.
    pub index: usize,
    /// Identifier the source would have been published under.
    pub source_id: String,
    /// Why it was skipped.
    pub error: LoadError,
}

/// Outcome of publishing one parsed source.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The source was attached to the tree.
    Published(PublishedSource),
    /// The source failed to parse or to attach; loading continued.
    Failed(FailedSource),
}

impl LoadOutcome {
    /// Machine-friendly discriminator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Published(_) => "published",
            Self::Failed(_) => "failed",
        }
    }

    /// Position of the source in the input sequence.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Published(source) => source.index,
            Self::Failed(source) => source.index,
        }
    }
}

/// Summary of a completed load run.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Published sources in publication order.
    pub published: Vec<PublishedSource>,
    /// Skipped sources in input order.
    pub failed: Vec<FailedSource>,
}

impl LoadReport {
    fn record(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Published(source) => self.published.push(source),
            LoadOutcome::Failed(source) => self.failed.push(source),
        }
    }
}

/// Spawns load runs against a shared parser.
#[derive(Clone)]
pub struct LoadAgent {
    parser: Arc<dyn DocumentParser>,
    options: LoadOptions,
}

impl std::fmt::Debug for LoadAgent {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("LoadAgent")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl LoadAgent {
    /// Agent using `parser` with default options.
    #[must_use]
    pub fn new(parser: impl DocumentParser + 'static) -> Self {
        Self {
            parser: Arc::new(parser),
            options: LoadOptions::default(),
        }
    }

    /// Replace the run options.
    #[must_use]
    pub const fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Options applied to new runs.
    #[must_use]
    pub const fn options(&self) -> LoadOptions {
        self.options
    }

    /// Start loading `sources` on the current tokio runtime.
    ///
    /// An empty input yields a handle that completes immediately.
    pub fn spawn<I, P>(&self, sources: I) -> LoadHandle
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let sources: Vec<PathBuf> = sources.into_iter().map(Into::into).collect();
        let total = sources.len();
        let (sender, receiver) = mpsc::channel(self.options.channel_capacity.max(1));
        let driver = tokio::spawn(drive(
            Arc::clone(&self.parser),
            sources,
            self.options.parse_concurrency.max(1),
            sender,
        ));
        LoadHandle {
            receiver,
            driver,
            total,
        }
    }
}

/// Caller side of a load run.
///
/// Dropping the handle cancels the run: the driver and every in-flight parse
/// are aborted. Subtrees published so far stay in the tree.
#[derive(Debug)]
pub struct LoadHandle {
    receiver: mpsc::Receiver<ParsedSource>,
    driver: JoinHandle<()>,
    total: usize,
}

impl LoadHandle {
    /// Number of sources in the run.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Next parsed source in input order; `None` once the run is over.
    pub async fn next(&mut self) -> Option<ParsedSource> {
        self.receiver.recv().await
    }

    /// Receive the next parsed source and attach it to `tree`.
    pub async fn publish_next(&mut self, tree: &mut DocumentTree) -> Option<LoadOutcome> {
        let parsed = self.next().await?;
        Some(publish(tree, parsed))
    }

    /// Publish every remaining source into `tree`.
    pub async fn publish_all(mut self, tree: &mut DocumentTree) -> LoadReport {
        let mut report = LoadReport::default();
        while let Some(outcome) = self.publish_next(tree).await {
            report.record(outcome);
        }
        info!(
            published = report.published.len(),
            failed = report.failed.len(),
            "load run finished"
        );
        report
    }

    /// Stop the run. Results already buffered are still delivered by
    /// [`LoadHandle::next`]; nothing new arrives.
    pub fn cancel(&mut self) {
        self.driver.abort();
        self.receiver.close();
        debug!("load run cancelled");
    }
}

impl Drop for LoadHandle {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Attach one parsed source to `tree`.
///
/// Parse and publication failures are logged and returned as
/// [`LoadOutcome::Failed`].
pub fn publish(tree: &mut DocumentTree, parsed: ParsedSource) -> LoadOutcome {
    let ParsedSource {
        index,
        source_id,
        path,
        result,
    } = parsed;
    let attached = result.and_then(|document| {
        tree.add_root(source_id.clone(), &document)
            .map_err(|source| LoadError::Publish {
                source_id: source_id.clone(),
                source,
            })
    });
    match attached {
        Ok(node) => {
            info!(source = %source_id, %node, index, "source published");
            LoadOutcome::Published(PublishedSource {
                index,
                source_id,
                node,
            })
        }
        Err(error) => {
            warn!(source = %source_id, path = %path.display(), index, error = %error, "source skipped");
            LoadOutcome::Failed(FailedSource {
                index,
                source_id,
                error,
            })
        }
    }
}

/// Identifier a source path is published under.
#[must_use]
pub fn source_id_for(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[instrument(name = "load.drive", skip_all, fields(sources = sources.len(), concurrency = concurrency))]
async fn drive(
    parser: Arc<dyn DocumentParser>,
    sources: Vec<PathBuf>,
    concurrency: usize,
    sender: mpsc::Sender<ParsedSource>,
) {
    let mut pending = sources.into_iter().enumerate();
    let mut window: VecDeque<(usize, PathBuf, AbortOnDrop<LoadResult<Document>>)> =
        VecDeque::with_capacity(concurrency);
    loop {
        while window.len() < concurrency
            && let Some((index, path)) = pending.next()
        {
            let parser = Arc::clone(&parser);
            let task_path = path.clone();
            let task = tokio::spawn(async move { parser.parse(&task_path).await });
            window.push_back((index, path, AbortOnDrop(task)));
        }
        let Some((index, path, mut task)) = window.pop_front() else {
            break;
        };

        let result = match (&mut task.0).await {
            Ok(result) => result,
            Err(err) => Err(LoadError::Worker {
                path: path.clone(),
                detail: err.to_string(),
            }),
        };
        debug!(index, ok = result.is_ok(), "source parsed");
        let parsed = ParsedSource {
            index,
            source_id: source_id_for(&path),
            path,
            result,
        };
        if sender.send(parsed).await.is_err() {
            debug!("load handle dropped; stopping driver");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_input_completes_immediately() {
        let agent = LoadAgent::new(crate::parser::BencodeFileParser::default());
        let mut tree = DocumentTree::new();
        let handle = agent.spawn(Vec::<PathBuf>::new());
        assert_eq!(handle.total(), 0);
        let report = handle.publish_all(&mut tree).await;
        assert!(report.published.is_empty());
        assert!(report.failed.is_empty());
        assert!(tree.is_empty());
    }

    #[test]
    fn failed_publication_is_reported() {
        let mut tree = DocumentTree::new();
        tree.add_root("a", &Document::from(1)).expect("added");
        let outcome = publish(
            &mut tree,
            ParsedSource {
                index: 3,
                source_id: "a".to_string(),
                path: PathBuf::from("a"),
                result: Ok(Document::from(2)),
            },
        );
        assert_eq!(outcome.kind(), "failed");
        assert_eq!(outcome.index(), 3);
        assert!(matches!(
            outcome,
            LoadOutcome::Failed(FailedSource {
                error: LoadError::Publish { .. },
                ..
            })
        ));
    }
}
