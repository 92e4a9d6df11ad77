//! Document fixtures.

use metatree_document::Document;

/// The two-file document used by the end-to-end edit scenario:
/// `{"info": {"files": [{"length": 1}, {"length": 2}]}}`.
#[must_use]
pub fn scenario_document() -> Document {
    Document::dict([(
        "info",
        Document::dict([(
            "files",
            Document::list([
                Document::dict([("length", Document::from(1))]),
                Document::dict([("length", Document::from(2))]),
            ]),
        )]),
    )])
}

/// A multi-file metainfo-like document with binary piece hashes.
#[must_use]
pub fn sample_metainfo() -> Document {
    // Continuation bytes only, so the hashes never decode as text.
    let pieces: Vec<u8> = (0_u8..60).map(|byte| byte | 0x80).collect();
    Document::dict([
        ("announce", Document::from("http://tracker.example/announce")),
        (
            "announce-list",
            Document::list([
                Document::list([Document::from("http://tracker.example/announce")]),
                Document::list([Document::from("udp://backup.example:6969")]),
            ]),
        ),
        ("comment", Document::from("fixture")),
        ("creation date", Document::from(1_700_000_000)),
        (
            "info",
            Document::dict([
                (
                    "files",
                    Document::list([
                        Document::dict([
                            ("length", Document::from(1024)),
                            ("path", Document::list([Document::from("a.txt")])),
                        ]),
                        Document::dict([
                            ("length", Document::from(2048)),
                            (
                                "path",
                                Document::list([Document::from("dir"), Document::from("b.bin")]),
                            ),
                        ]),
                    ]),
                ),
                ("name", Document::from("fixture")),
                ("piece length", Document::from(16_384)),
                ("pieces", Document::from(pieces)),
            ]),
        ),
    ])
}

/// Single-file document named `name` with one `length` field.
#[must_use]
pub fn single_file(name: &str, length: i64) -> Document {
    Document::dict([(
        "info",
        Document::dict([
            ("length", Document::from(length)),
            ("name", Document::from(name)),
        ]),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_have_expected_shapes() {
        assert_eq!(scenario_document().depth(), 4);
        let metainfo = sample_metainfo();
        let pieces = metainfo
            .get("info")
            .and_then(|info| info.get("pieces"))
            .and_then(Document::as_scalar)
            .and_then(|pieces| pieces.as_bytes().map(<[u8]>::len));
        assert_eq!(pieces, Some(60));
    }
}
