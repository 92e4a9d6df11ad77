//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use metatree_document::{Document, json};
use metatree_model::{NodeId, NodePresenter, TreeNavigation, ValueShape};

use crate::cli::OutputFormat;
use crate::context::{CliError, CliResult};

/// Indented rows for the subtree at `id`, `depth` levels deep.
pub(crate) fn tree_lines(
    navigation: &dyn TreeNavigation,
    presenter: &NodePresenter,
    id: NodeId,
    depth: Option<usize>,
) -> Vec<String> {
    let mut lines = Vec::new();
    push_rows(navigation, presenter, id, depth, 0, &mut lines);
    lines
}

fn push_rows(
    navigation: &dyn TreeNavigation,
    presenter: &NodePresenter,
    id: NodeId,
    remaining: Option<usize>,
    indent: usize,
    lines: &mut Vec<String>,
) {
    let Some(data) = navigation.data(id) else {
        return;
    };
    if let Some(row) = presenter.render_row(navigation, id) {
        lines.push(format!("{:indent$}{row}", "", indent = indent * 2));
    }
    if data.shape == Some(ValueShape::Scalar) || remaining == Some(0) {
        return;
    }
    let remaining = remaining.map(|levels| levels - 1);
    for row in 0..navigation.row_count(id) {
        if let Ok(child) = navigation.child_at(id, row) {
            push_rows(navigation, presenter, child, remaining, indent + 1, lines);
        }
    }
}

pub(crate) fn json_text(document: &Document) -> CliResult<String> {
    serde_json::to_string_pretty(&json::to_json(document))
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

/// Print the subtree at `id`; JSON output renders `document`, its serialized
/// form.
pub(crate) fn render_subtree(
    navigation: &dyn TreeNavigation,
    presenter: &NodePresenter,
    id: NodeId,
    document: &Document,
    depth: Option<usize>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", json_text(document)?),
        OutputFormat::Tree => {
            for line in tree_lines(navigation, presenter, id, depth) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use metatree_model::DocumentTree;
    use metatree_test_support::fixtures::scenario_document;

    use super::*;

    #[test]
    fn tree_lines_indent_and_respect_depth() {
        let mut tree = DocumentTree::new();
        let source = tree
            .add_root("a.torrent", &scenario_document())
            .expect("added");
        let presenter = NodePresenter::default();

        let lines = tree_lines(&tree, &presenter, source, None);
        assert_eq!(
            lines,
            vec![
                "a.torrent: dict (1 entries)",
                "  info: dict (1 entries)",
                "    files: list (2 items)",
                "      [0]: dict (1 entries)",
                "        length: 1",
                "      [1]: dict (1 entries)",
                "        length: 2",
            ]
        );

        let shallow = tree_lines(&tree, &presenter, source, Some(1));
        assert_eq!(shallow, vec!["a.torrent: dict (1 entries)", "  info: dict (1 entries)"]);
    }

    #[test]
    fn json_text_renders_bytes_as_base64() {
        let document = Document::dict([("pieces", Document::from(vec![0xff_u8, 0x00]))]);
        let text = json_text(&document).expect("json");
        assert!(text.contains("\"pieces\": \"/wA=\""), "{text}");
    }
}
