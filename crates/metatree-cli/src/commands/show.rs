use anyhow::anyhow;
use metatree_loader::LoadOutcome;
use tracing::{debug, instrument};

use crate::cli::{OutputFormat, ShowArgs};
use crate::context::{AppContext, CliError, CliResult};
use crate::output::{json_text, tree_lines};

/// Rows are printed as each source is published; JSON is printed once, keyed
/// by source, after the run.
#[instrument(name = "cli.show", skip_all, fields(sources = args.files.len()))]
pub(crate) async fn handle_show(ctx: &AppContext, args: ShowArgs) -> CliResult<()> {
    let mut tree = ctx.new_tree();
    let mut handle = ctx.agent().spawn(args.files);
    let total = handle.total();
    let presenter = ctx.presenter();
    let mut published = 0_usize;

    while let Some(outcome) = handle.publish_next(&mut tree).await {
        match outcome {
            LoadOutcome::Published(source) => {
                published += 1;
                if ctx.output == OutputFormat::Tree {
                    for line in tree_lines(&tree, &presenter, source.node, args.depth) {
                        println!("{line}");
                    }
                }
            }
            LoadOutcome::Failed(source) => {
                eprintln!("skipped {}: {}", source.source_id, error_chain(&source.error));
            }
        }
    }

    if published == 0 && total > 0 {
        return Err(CliError::failure(anyhow!(
            "none of the {total} sources could be loaded"
        )));
    }
    if ctx.output == OutputFormat::Json {
        let document = tree.serialize(tree.root()).map_err(CliError::failure)?;
        println!("{}", json_text(&document)?);
    }
    debug!(published, failed = total - published, nodes = tree.len(), "show finished");
    Ok(())
}

pub(crate) fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
