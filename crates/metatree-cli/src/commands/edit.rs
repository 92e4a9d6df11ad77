//! Single-file commands: inspection, export, and edits written back to disk.

use std::path::Path;

use metatree_document::{Document, Scalar};
use metatree_model::{TreeNavigation, ValueShape};
use tracing::{info, instrument};

use crate::cli::{ExportArgs, GetArgs, InsertArgs, RemoveArgs, SetArgs, ValueKind};
use crate::context::{AppContext, CliError, CliResult, OpenedSource};
use crate::output::{json_text, render_subtree};

#[instrument(name = "cli.get", skip_all, fields(file = %args.file.display(), path = %args.path))]
pub(crate) async fn handle_get(ctx: &AppContext, args: GetArgs) -> CliResult<()> {
    let opened = ctx.open(&args.file).await?;
    let target = opened.resolve(&args.path)?;
    let document = opened.tree.serialize(target).map_err(CliError::failure)?;
    render_subtree(
        &opened.tree,
        &ctx.presenter(),
        target,
        &document,
        None,
        ctx.output,
    )
}

#[instrument(name = "cli.export", skip_all, fields(file = %args.file.display()))]
pub(crate) async fn handle_export(ctx: &AppContext, args: ExportArgs) -> CliResult<()> {
    let opened = ctx.open(&args.file).await?;
    let document = opened.tree.serialize(opened.node).map_err(CliError::failure)?;
    println!("{}", json_text(&document)?);
    Ok(())
}

#[instrument(name = "cli.set", skip_all, fields(file = %args.file.display(), path = %args.path))]
pub(crate) async fn handle_set(ctx: &AppContext, args: SetArgs) -> CliResult<()> {
    let mut opened = ctx.open(&args.file).await?;
    let changed = apply_set(&mut opened, &args.path, &args.value, args.kind)?;
    if !changed {
        println!("unchanged: {}", args.path);
        return Ok(());
    }
    finish(&opened, args.out.as_deref()).await
}

#[instrument(name = "cli.remove", skip_all, fields(file = %args.file.display(), path = %args.path))]
pub(crate) async fn handle_remove(ctx: &AppContext, args: RemoveArgs) -> CliResult<()> {
    let mut opened = ctx.open(&args.file).await?;
    apply_remove(&mut opened, &args.path)?;
    finish(&opened, args.out.as_deref()).await
}

#[instrument(name = "cli.insert", skip_all, fields(file = %args.file.display(), path = %args.path))]
pub(crate) async fn handle_insert(ctx: &AppContext, args: InsertArgs) -> CliResult<()> {
    let mut opened = ctx.open(&args.file).await?;
    apply_insert(&mut opened, &args.path, &args.key, &args.value, args.kind)?;
    finish(&opened, args.out.as_deref()).await
}

async fn finish(opened: &OpenedSource, out: Option<&Path>) -> CliResult<()> {
    let written = opened.write_back(out).await?;
    println!("wrote {}", written.display());
    Ok(())
}

fn apply_set(opened: &mut OpenedSource, path: &str, raw: &str, kind: ValueKind) -> CliResult<bool> {
    let target = opened.resolve(path)?;
    let current = opened
        .tree
        .value_node(target)
        .and_then(|leaf| opened.tree.node(leaf))
        .and_then(|leaf| leaf.effective_value());
    let value = coerce(raw, kind, current)?;
    let changed = opened
        .tree
        .set_data(target, Document::Scalar(value))
        .map_err(CliError::failure)?;
    info!(path, changed, "value set");
    Ok(changed)
}

fn apply_remove(opened: &mut OpenedSource, path: &str) -> CliResult<()> {
    let target = opened.resolve(path)?;
    if target == opened.node {
        return Err(CliError::validation("refusing to remove the whole document"));
    }
    opened
        .tree
        .remove_subtree(target)
        .map_err(CliError::failure)?;
    info!(path, "entry removed");
    Ok(())
}

fn apply_insert(
    opened: &mut OpenedSource,
    path: &str,
    key: &str,
    raw: &str,
    kind: ValueKind,
) -> CliResult<()> {
    let parent = opened.resolve(path)?;
    let document = Document::Scalar(coerce(raw, kind, None)?);
    let shape = opened.tree.node(parent).and_then(|node| node.shape());
    let inserted = match shape {
        Some(ValueShape::Dict) => opened.tree.insert_entry(parent, key, &document),
        Some(ValueShape::List) => {
            let index = key.parse::<usize>().map_err(|_| {
                CliError::validation(format!("list position `{key}` is not a number"))
            })?;
            opened.tree.insert_item(parent, index, &document)
        }
        _ => {
            return Err(CliError::validation(format!(
                "path `{path}` is not a dictionary or list"
            )));
        }
    };
    inserted.map_err(CliError::failure)?;
    info!(path, key, "value inserted");
    Ok(())
}

/// Turn command-line text into a scalar. `Auto` follows the type of `current`
/// and falls back to integer-or-text for new values.
pub(crate) fn coerce(raw: &str, kind: ValueKind, current: Option<&Scalar>) -> CliResult<Scalar> {
    match (kind, current) {
        (ValueKind::Int, _) | (ValueKind::Auto, Some(Scalar::Integer(_))) => raw
            .trim()
            .parse::<i64>()
            .map(Scalar::Integer)
            .map_err(|_| CliError::validation(format!("`{raw}` is not an integer"))),
        (ValueKind::Text, _) | (ValueKind::Auto, Some(Scalar::Text(_))) => {
            Ok(Scalar::Text(raw.to_string()))
        }
        (ValueKind::Hex, _) | (ValueKind::Auto, Some(Scalar::Bytes(_))) => {
            decode_hex(raw).map(Scalar::Bytes)
        }
        (ValueKind::Auto, None) => Ok(raw
            .parse::<i64>()
            .map_or_else(|_| Scalar::Text(raw.to_string()), Scalar::Integer)),
    }
}

fn decode_hex(raw: &str) -> CliResult<Vec<u8>> {
    let digits = raw.trim();
    if !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(CliError::validation(format!("`{raw}` is not valid hex")));
    }
    if digits.len() % 2 != 0 {
        return Err(CliError::validation("hex value must have an even number of digits"));
    }
    (0..digits.len())
        .step_by(2)
        .map(|start| {
            u8::from_str_radix(&digits[start..start + 2], 16)
                .map_err(|_| CliError::validation(format!("`{raw}` is not valid hex")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use metatree_config::TreeConfig;
    use metatree_document::bencode;
    use metatree_test_support::fixtures::sample_metainfo;
    use metatree_test_support::sources::SourceDir;

    use super::*;
    use crate::cli::OutputFormat;

    fn context() -> AppContext {
        AppContext {
            config: TreeConfig::default(),
            output: OutputFormat::Tree,
        }
    }

    fn reread(path: &Path) -> Document {
        let bytes = std::fs::read(path).expect("written file");
        bencode::decode(&bytes).expect("valid bencode")
    }

    #[test]
    fn auto_coercion_follows_the_current_type() {
        let integer = Scalar::Integer(1);
        assert_eq!(
            coerce("42", ValueKind::Auto, Some(&integer)).expect("int"),
            Scalar::Integer(42)
        );
        assert!(matches!(
            coerce("many", ValueKind::Auto, Some(&integer)),
            Err(CliError::Validation(_))
        ));
        assert_eq!(
            coerce("42", ValueKind::Auto, Some(&Scalar::from("x"))).expect("text"),
            Scalar::from("42")
        );
        assert_eq!(
            coerce("00ff", ValueKind::Auto, Some(&Scalar::Bytes(vec![1]))).expect("bytes"),
            Scalar::Bytes(vec![0x00, 0xff])
        );
        assert_eq!(
            coerce("7", ValueKind::Auto, None).expect("new"),
            Scalar::Integer(7)
        );
        assert_eq!(
            coerce("seven", ValueKind::Auto, None).expect("new"),
            Scalar::from("seven")
        );
    }

    #[test]
    fn hex_input_is_validated() {
        assert!(decode_hex("abc").is_err());
        assert!(decode_hex("zz").is_err());
        assert!(decode_hex("+f").is_err());
        assert_eq!(decode_hex("DEad").expect("hex"), vec![0xde, 0xad]);
    }

    #[tokio::test]
    async fn set_writes_only_the_edited_value() {
        let dir = SourceDir::new().expect("dir");
        let path = dir.write("a.torrent", &sample_metainfo()).expect("written");
        let out = dir.path().join("b.torrent");

        let mut opened = context().open(&path).await.expect("opened");
        assert!(apply_set(&mut opened, "info/piece length", "32768", ValueKind::Auto).expect("set"));
        opened.write_back(Some(&out)).await.expect("write back");

        let mut expected = sample_metainfo();
        if let Document::Dict(entries) = &mut expected
            && let Some(Document::Dict(info)) = entries.get_mut("info")
        {
            info.insert("piece length".to_string(), Document::from(32768));
        }
        assert_eq!(reread(&out), expected);
        assert_eq!(reread(&path), sample_metainfo());
    }

    #[tokio::test]
    async fn setting_the_same_value_is_a_no_op() {
        let dir = SourceDir::new().expect("dir");
        let path = dir.write("a.torrent", &sample_metainfo()).expect("written");
        let mut opened = context().open(&path).await.expect("opened");
        let current = opened
            .tree
            .serialize(opened.resolve("comment").expect("comment"))
            .expect("serialized");
        let Document::Scalar(Scalar::Text(comment)) = current else {
            panic!("comment should be text");
        };
        assert!(!apply_set(&mut opened, "comment", &comment, ValueKind::Auto).expect("set"));
        assert!(opened.tree.edited_roots().is_empty());
    }

    #[tokio::test]
    async fn remove_and_insert_reshape_containers() {
        let dir = SourceDir::new().expect("dir");
        let path = dir.write("a.torrent", &sample_metainfo()).expect("written");
        let mut opened = context().open(&path).await.expect("opened");

        apply_remove(&mut opened, "comment").expect("removed");
        apply_insert(&mut opened, "info/files", "0", "12", ValueKind::Int).expect("inserted");
        apply_insert(&mut opened, "", "created by", "metatree", ValueKind::Auto)
            .expect("inserted");
        opened.write_back(None).await.expect("write back");

        let written = reread(&path);
        assert!(written.get("comment").is_none());
        assert_eq!(
            written.get("created by").and_then(Document::as_scalar),
            Some(&Scalar::from("metatree"))
        );
        let files = written
            .get("info")
            .and_then(|info| info.get("files"))
            .and_then(Document::as_list)
            .expect("files");
        assert_eq!(files[0], Document::from(12));
    }

    #[tokio::test]
    async fn invalid_edits_are_validation_errors() {
        let dir = SourceDir::new().expect("dir");
        let path = dir.write("a.torrent", &sample_metainfo()).expect("written");
        let mut opened = context().open(&path).await.expect("opened");

        assert!(matches!(
            apply_set(&mut opened, "info/missing", "1", ValueKind::Auto),
            Err(CliError::Validation(_))
        ));
        assert!(matches!(apply_remove(&mut opened, ""), Err(CliError::Validation(_))));
        assert!(matches!(
            apply_insert(&mut opened, "info/files", "first", "1", ValueKind::Int),
            Err(CliError::Validation(_))
        ));
        assert!(matches!(
            apply_insert(&mut opened, "comment", "x", "1", ValueKind::Int),
            Err(CliError::Validation(_))
        ));
        assert!(matches!(
            apply_insert(&mut opened, "", "comment", "dup", ValueKind::Text),
            Err(CliError::Failure(_))
        ));
    }
}
