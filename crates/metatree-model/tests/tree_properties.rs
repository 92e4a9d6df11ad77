//! Tree-level behaviour exercised through the public API.

use anyhow::{Context, Result};
use metatree_document::Document;
use metatree_document::bencode::{self, MAX_SUPPORTED_DEPTH};
use metatree_model::{BuildLimits, DocumentTree, NodeKey, NodeKind, RecordingObserver, StructureChange};
use metatree_test_support::fixtures::{sample_metainfo, scenario_document};
use proptest::prelude::*;

fn edit_scenario() -> Document {
    Document::dict([
        ("name", Document::from("x")),
        (
            "files",
            Document::list([
                Document::dict([("path", Document::from("a/b")), ("length", Document::from(10))]),
                Document::dict([("path", Document::from("c")), ("length", Document::from(20))]),
            ]),
        ),
    ])
}

#[test]
fn deepest_supported_document_loads_and_writes_on_a_small_stack() -> Result<()> {
    let worker = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| -> Result<()> {
            let mut input = vec![b'l'; MAX_SUPPORTED_DEPTH];
            input.extend(std::iter::repeat_n(b'e', MAX_SUPPORTED_DEPTH));
            let document = bencode::decode_with_limit(&input, MAX_SUPPORTED_DEPTH)?;

            let mut tree = DocumentTree::with_limits(BuildLimits { max_depth: usize::MAX });
            assert_eq!(tree.limits().max_depth, MAX_SUPPORTED_DEPTH);
            let source = tree.add_root("deep", &document)?;
            let written = tree.serialize_with_base(source, &document)?;
            assert_eq!(bencode::encode(&written), input);
            assert_eq!(tree.serialize(source)?, document);
            Ok(())
        })?;
    worker
        .join()
        .map_err(|_| anyhow::anyhow!("deep document worker panicked"))?
}

#[test]
fn built_scenario_edits_one_leaf_and_flags_its_ancestors() -> Result<()> {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let document = edit_scenario();
    tree.build(&document, root)?;

    let root_node = tree.get(root)?;
    assert_eq!(root_node.child_count(), 2);
    let name = tree.child_at(root, 0)?;
    let files = tree.child_at(root, 1)?;
    assert_eq!(tree.get(name)?.kind(), NodeKind::MapEntry);
    assert_eq!(tree.get(files)?.child_count(), 2);
    let slot = tree.child_at(files, 0)?;
    assert_eq!(tree.get(slot)?.kind(), NodeKind::ListSlot);
    assert_eq!(tree.get(slot)?.key(), Some(&NodeKey::Index(0)));

    let length = tree.resolve(slot, "length").context("length entry")?;
    let leaf = tree.value_node(length).context("length leaf")?;
    assert!(tree.set_scalar(leaf, 99)?);

    for id in [leaf, length, slot, files, root] {
        assert!(tree.get(id)?.is_edited(), "{id} should be edited");
    }
    assert!(!tree.get(name)?.is_edited());
    assert!(!tree.get(tree.child_at(files, 1)?)?.is_edited());

    let expected = Document::dict([
        ("name", Document::from("x")),
        (
            "files",
            Document::list([
                Document::dict([("path", Document::from("a/b")), ("length", Document::from(99))]),
                Document::dict([("path", Document::from("c")), ("length", Document::from(20))]),
            ]),
        ),
    ]);
    assert_eq!(tree.serialize(root)?, expected);
    assert_eq!(tree.serialize_with_base(root, &document)?, expected);
    Ok(())
}

#[test]
fn setting_the_current_value_changes_nothing() -> Result<()> {
    let mut tree = DocumentTree::new();
    let source = tree.add_root("scenario", &scenario_document())?;
    let recorder = RecordingObserver::new();
    tree.subscribe(recorder.clone());

    let leaf = tree
        .resolve(source, "info/files/1/length")
        .and_then(|entry| tree.value_node(entry))
        .context("leaf")?;
    assert!(!tree.set_scalar(leaf, 2)?);
    assert!(tree.edited_roots().is_empty());
    assert!(recorder.changes().is_empty());
    Ok(())
}

#[test]
fn removing_twice_matches_removing_once() -> Result<()> {
    let mut tree = DocumentTree::new();
    let source = tree.add_root("m", &sample_metainfo())?;
    let comment = tree.resolve(source, "comment").context("comment")?;

    assert!(tree.remove_subtree(comment)?);
    let after_first = tree.serialize(source)?;
    let live = tree.len();

    let recorder = RecordingObserver::new();
    tree.subscribe(recorder.clone());
    assert!(!tree.remove_subtree(comment)?);
    assert_eq!(tree.serialize(source)?, after_first);
    assert_eq!(tree.len(), live);
    assert!(recorder.changes().is_empty());
    Ok(())
}

#[test]
fn key_order_survives_edits() -> Result<()> {
    let mut tree = DocumentTree::new();
    let source = tree.add_root(
        "ordered",
        &Document::dict([
            ("k1", Document::from(1)),
            ("k2", Document::from(2)),
            ("k3", Document::from(3)),
        ]),
    )?;
    let middle = tree
        .resolve(source, "k2")
        .and_then(|entry| tree.value_node(entry))
        .context("k2")?;
    tree.set_scalar(middle, "two")?;
    tree.set_value(middle, &Document::list([Document::from(2)]))?;

    let keys: Vec<_> = tree
        .get(source)?
        .children()
        .iter()
        .map(|child| tree.get(*child).map(|node| node.key().cloned()))
        .collect::<Result<_, _>>()?;
    assert_eq!(
        keys,
        ["k1", "k2", "k3"]
            .map(|key| Some(NodeKey::Name(key.to_string())))
            .to_vec()
    );
    Ok(())
}

#[test]
fn list_insert_is_bracketed_and_renumbers_slots() -> Result<()> {
    let mut tree = DocumentTree::new();
    let source = tree.add_root("scenario", &scenario_document())?;
    let files = tree.resolve(source, "info/files").context("files")?;
    let recorder = RecordingObserver::new();
    tree.subscribe(recorder.clone());

    let inserted = tree.insert_item(files, 0, &Document::dict([("length", Document::from(0))]))?;
    let changes = recorder.take();
    assert_eq!(
        changes.first(),
        Some(&StructureChange::RowsAboutToBeInserted {
            parent: files,
            first: 0,
            last: 0
        })
    );
    assert_eq!(
        changes.get(1),
        Some(&StructureChange::RowsInserted {
            parent: files,
            first: 0,
            last: 0
        })
    );
    assert_eq!(tree.path_of(inserted).as_deref(), Some("info/files/0"));
    let moved = tree.child_at(files, 2)?;
    assert_eq!(tree.get(moved)?.key(), Some(&NodeKey::Index(2)));
    assert_eq!(tree.edited_roots(), vec![source]);
    assert_eq!(tree.find_inconsistent_edit_flag(), None);
    Ok(())
}

fn document() -> impl Strategy<Value = Document> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Document::from),
        "[a-z ]{0,8}".prop_map(Document::from),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Document::from),
    ];
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Document::List),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4).prop_map(Document::dict),
        ]
    })
}

proptest! {
    #[test]
    fn unedited_documents_round_trip(doc in document()) {
        let mut tree = DocumentTree::new();
        let source = tree.add_root("generated", &doc).expect("added");
        prop_assert_eq!(tree.serialize(source).expect("serialized"), doc);
        prop_assert_eq!(tree.find_inconsistent_edit_flag(), None);
    }
}
