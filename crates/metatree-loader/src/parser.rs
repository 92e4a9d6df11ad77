//! Parser seam used by the load agent.

use std::path::Path;

use async_trait::async_trait;
use metatree_document::Document;
use metatree_document::bencode::{self, DEFAULT_MAX_DEPTH};

use crate::error::{LoadError, LoadResult};

/// Default ceiling on the size of a single source file.
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 64 * 1024 * 1024;

/// Turns one source into a document.
///
/// Implementations run on the agent's worker tasks, never on the caller's
/// control flow, and must not touch any tree.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Parse the source at `path`.
    async fn parse(&self, path: &Path) -> LoadResult<Document>;
}

/// Reads a file with `tokio::fs` and decodes it as strict bencode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BencodeFileParser {
    max_source_bytes: u64,
    max_depth: usize,
}

impl Default for BencodeFileParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SOURCE_BYTES, DEFAULT_MAX_DEPTH)
    }
}

impl BencodeFileParser {
    /// Parser rejecting files over `max_source_bytes` or nested deeper than
    /// `max_depth`.
    #[must_use]
    pub const fn new(max_source_bytes: u64, max_depth: usize) -> Self {
        Self {
            max_source_bytes,
            max_depth,
        }
    }
}

#[async_trait]
impl DocumentParser for BencodeFileParser {
    async fn parse(&self, path: &Path) -> LoadResult<Document> {
        let read_error = |source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        };
        let size = tokio::fs::metadata(path).await.map_err(read_error)?.len();
        if size > self.max_source_bytes {
            return Err(LoadError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_source_bytes,
            });
        }
        let bytes = tokio::fs::read(path).await.map_err(read_error)?;

        let max_depth = self.max_depth;
        let decoded = tokio::task::spawn_blocking(move || bencode::decode_with_limit(&bytes, max_depth))
            .await
            .map_err(|err| LoadError::Worker {
                path: path.to_path_buf(),
                detail: err.to_string(),
            })?;
        decoded.map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use metatree_document::BencodeError;
    use metatree_test_support::fixtures::scenario_document;
    use metatree_test_support::sources::SourceDir;

    use super::*;

    #[tokio::test]
    async fn decodes_valid_sources() -> anyhow::Result<()> {
        let dir = SourceDir::new()?;
        let path = dir.write("a.torrent", &scenario_document())?;
        let document = BencodeFileParser::default().parse(&path).await?;
        assert_eq!(document, scenario_document());
        Ok(())
    }

    #[tokio::test]
    async fn reports_missing_oversized_and_corrupt_sources() -> anyhow::Result<()> {
        let dir = SourceDir::new()?;
        let parser = BencodeFileParser::new(8, DEFAULT_MAX_DEPTH);

        let missing = dir.path().join("missing.torrent");
        assert!(matches!(
            parser.parse(&missing).await,
            Err(LoadError::Read { .. })
        ));

        let big = dir.write_bytes("big.torrent", b"d4:name10:0123456789e")?;
        assert!(matches!(
            parser.parse(&big).await,
            Err(LoadError::TooLarge { size: 21, limit: 8, .. })
        ));

        let corrupt = dir.write_bytes("bad.torrent", b"i01e")?;
        match parser.parse(&corrupt).await {
            Err(LoadError::Decode { path, source }) => {
                assert_eq!(path, corrupt);
                assert_eq!(source.offset(), 0);
            }
            other => panic!("expected decode failure, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn sources_nested_past_the_supported_depth_fail_alone() -> anyhow::Result<()> {
        let dir = SourceDir::new()?;
        let depth = bencode::MAX_SUPPORTED_DEPTH * 8;
        let mut nested = vec![b'l'; depth];
        nested.extend(std::iter::repeat_n(b'e', depth));
        let deep = dir.write_bytes("deep.torrent", &nested)?;

        let parser = BencodeFileParser::new(DEFAULT_MAX_SOURCE_BYTES, usize::MAX);
        match parser.parse(&deep).await {
            Err(LoadError::Decode { source, .. }) => assert_eq!(
                source,
                BencodeError::DepthExceeded {
                    offset: bencode::MAX_SUPPORTED_DEPTH,
                    limit: bencode::MAX_SUPPORTED_DEPTH,
                }
            ),
            other => panic!("expected depth failure, got {other:?}"),
        }

        let shallow = dir.write("a.torrent", &scenario_document())?;
        assert_eq!(parser.parse(&shallow).await?, scenario_document());
        Ok(())
    }
}
