//! Strict bencode codec.
//!
//! Wire format:
//! - Integer: `i<decimal>e`, canonical only (no leading zeros, no `-0`)
//! - String:  `<byte_len>:<bytes>`, decoded as text when valid UTF-8
//! - List:    `l<items>e`
//! - Dict:    `d<key><value>...e`, keys kept in wire order
//!
//! Decoding then encoding an input reproduces it byte for byte: strings keep
//! their bytes whichever scalar they land in, and dictionary order is never
//! re-sorted.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::error::{BencodeError, BencodeResult};
use crate::value::{Document, Scalar};

/// Default nesting limit applied by [`decode`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Deepest nesting any limit may allow. The codec and the tree walks recurse
/// once per level and must fit a 2 MiB thread stack.
pub const MAX_SUPPORTED_DEPTH: usize = 512;

/// Decode a complete bencoded value, rejecting trailing bytes.
///
/// # Errors
///
/// Returns a [`BencodeError`] describing the first malformed byte.
pub fn decode(input: &[u8]) -> BencodeResult<Document> {
    decode_with_limit(input, DEFAULT_MAX_DEPTH)
}

/// Decode with an explicit nesting limit, capped at [`MAX_SUPPORTED_DEPTH`].
///
/// # Errors
///
/// Returns a [`BencodeError`] describing the first malformed byte, or
/// [`BencodeError::DepthExceeded`] when containers nest deeper than `max_depth`.
pub fn decode_with_limit(input: &[u8], max_depth: usize) -> BencodeResult<Document> {
    let mut cursor = Cursor {
        data: input,
        pos: 0,
        max_depth: max_depth.min(MAX_SUPPORTED_DEPTH),
    };
    let document = cursor.read_any(0)?;
    if cursor.pos != input.len() {
        return Err(BencodeError::TrailingData { offset: cursor.pos });
    }
    Ok(document)
}

/// Encode a document.
#[must_use]
pub fn encode(document: &Document) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(document, &mut out);
    out
}

/// Append the encoding of `document` to `out`.
pub fn encode_into(document: &Document, out: &mut Vec<u8>) {
    match document {
        Document::Scalar(Scalar::Integer(value)) => {
            out.push(b'i');
            out.extend_from_slice(value.to_string().as_bytes());
            out.push(b'e');
        }
        Document::Scalar(Scalar::Text(text)) => write_bytes(text.as_bytes(), out),
        Document::Scalar(Scalar::Bytes(bytes)) => write_bytes(bytes, out),
        Document::List(items) => {
            out.push(b'l');
            for item in items {
                encode_into(item, out);
            }
            out.push(b'e');
        }
        Document::Dict(entries) => {
            out.push(b'd');
            for (key, value) in entries {
                write_bytes(key.as_bytes(), out);
                encode_into(value, out);
            }
            out.push(b'e');
        }
    }
}

fn write_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> BencodeResult<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(BencodeError::UnexpectedEof { offset: self.pos })
    }

    fn bump(&mut self) -> BencodeResult<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_any(&mut self, depth: usize) -> BencodeResult<Document> {
        match self.peek()? {
            b'i' => self.read_integer().map(|value| Document::Scalar(Scalar::Integer(value))),
            b'l' => self.read_list(depth),
            b'd' => self.read_dict(depth),
            b'0'..=b'9' => {
                let bytes = self.read_bytes()?;
                Ok(Document::Scalar(match String::from_utf8(bytes) {
                    Ok(text) => Scalar::Text(text),
                    Err(err) => Scalar::Bytes(err.into_bytes()),
                }))
            }
            byte => Err(BencodeError::InvalidByte {
                offset: self.pos,
                byte,
            }),
        }
    }

    fn enter(&self, depth: usize) -> BencodeResult<usize> {
        let next = depth + 1;
        if next > self.max_depth {
            return Err(BencodeError::DepthExceeded {
                offset: self.pos,
                limit: self.max_depth,
            });
        }
        Ok(next)
    }

    fn read_integer(&mut self) -> BencodeResult<i64> {
        let start = self.pos;
        self.bump()?;
        let digits_start = self.pos;
        loop {
            match self.bump()? {
                b'e' => break,
                b'-' | b'0'..=b'9' => {}
                byte => {
                    return Err(BencodeError::InvalidByte {
                        offset: self.pos - 1,
                        byte,
                    });
                }
            }
        }
        let digits = &self.data[digits_start..self.pos - 1];
        if !is_canonical_integer(digits) {
            return Err(BencodeError::InvalidInteger { offset: start });
        }
        std::str::from_utf8(digits)
            .ok()
            .and_then(|text| text.parse::<i64>().ok())
            .ok_or(BencodeError::InvalidInteger { offset: start })
    }

    fn read_bytes(&mut self) -> BencodeResult<Vec<u8>> {
        let start = self.pos;
        let mut len: usize = 0;
        loop {
            match self.bump()? {
                b':' => break,
                byte @ b'0'..=b'9' => {
                    if self.pos - 1 > start && self.data[start] == b'0' {
                        return Err(BencodeError::InvalidByte {
                            offset: self.pos - 1,
                            byte,
                        });
                    }
                    len = len
                        .checked_mul(10)
                        .and_then(|value| value.checked_add(usize::from(byte - b'0')))
                        .ok_or(BencodeError::LengthOverflow { offset: start })?;
                }
                byte => {
                    return Err(BencodeError::InvalidByte {
                        offset: self.pos - 1,
                        byte,
                    });
                }
            }
        }
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(BencodeError::LengthOverflow { offset: start })?;
        let bytes = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(bytes)
    }

    fn read_list(&mut self, depth: usize) -> BencodeResult<Document> {
        let depth = self.enter(depth)?;
        self.bump()?;
        let mut items = Vec::new();
        while self.peek()? != b'e' {
            items.push(self.read_any(depth)?);
        }
        self.pos += 1;
        Ok(Document::List(items))
    }

    fn read_dict(&mut self, depth: usize) -> BencodeResult<Document> {
        let depth = self.enter(depth)?;
        self.bump()?;
        let mut entries = IndexMap::new();
        while self.peek()? != b'e' {
            let key_offset = self.pos;
            let key = match self.peek()? {
                b'0'..=b'9' => String::from_utf8(self.read_bytes()?)
                    .map_err(|_| BencodeError::KeyNotUtf8 { offset: key_offset })?,
                byte => {
                    return Err(BencodeError::InvalidByte {
                        offset: key_offset,
                        byte,
                    });
                }
            };
            let value = self.read_any(depth)?;
            match entries.entry(key) {
                Entry::Occupied(entry) => {
                    return Err(BencodeError::DuplicateKey {
                        offset: key_offset,
                        key: entry.key().clone(),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(value);
                }
            }
        }
        self.pos += 1;
        Ok(Document::Dict(entries))
    }
}

fn is_canonical_integer(digits: &[u8]) -> bool {
    let magnitude = digits.strip_prefix(b"-").unwrap_or(digits);
    if magnitude.is_empty() || !magnitude.iter().all(u8::is_ascii_digit) {
        return false;
    }
    if magnitude.len() > 1 && magnitude[0] == b'0' {
        return false;
    }
    !(digits.len() != magnitude.len() && magnitude == b"0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_nested_metainfo_shape() {
        let input = b"d4:name1:x5:filesld4:path3:a/b6:lengthi10eeee";
        let document = decode(input).expect("valid input");
        assert_eq!(document.get("name"), Some(&Document::from("x")));
        let files = document
            .get("files")
            .and_then(Document::as_list)
            .expect("files list");
        assert_eq!(files[0].get("length"), Some(&Document::from(10)));
        assert_eq!(encode(&document), input.to_vec());
    }

    #[test]
    fn keeps_non_utf8_strings_as_bytes() {
        let input = b"d6:pieces2:\xff\x00e";
        let document = decode(input).expect("valid input");
        assert_eq!(
            document.get("pieces"),
            Some(&Document::from(vec![0xff_u8, 0x00]))
        );
        assert_eq!(encode(&document), input.to_vec());
    }

    #[test]
    fn preserves_unsorted_key_order() {
        let input = b"d1:bi1e1:ai2ee";
        let document = decode(input).expect("valid input");
        let keys: Vec<_> = document.as_dict().expect("dict").keys().cloned().collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(encode(&document), input.to_vec());
    }

    #[test]
    fn rejects_non_canonical_integers() {
        for input in [&b"i03e"[..], b"i-0e", b"ie", b"i-e", b"i1-2e"] {
            assert!(
                matches!(decode(input), Err(BencodeError::InvalidInteger { offset: 0 })),
                "accepted {input:?}"
            );
        }
        assert_eq!(decode(b"i-42e"), Ok(Document::from(-42)));
    }

    #[test]
    fn rejects_structural_faults() {
        assert_eq!(
            decode(b"l1:a"),
            Err(BencodeError::UnexpectedEof { offset: 4 })
        );
        assert_eq!(decode(b"i1ei2e"), Err(BencodeError::TrailingData { offset: 3 }));
        assert_eq!(
            decode(b"5:abc"),
            Err(BencodeError::LengthOverflow { offset: 0 })
        );
        assert!(matches!(
            decode(b"d1:ai1e1:ai2ee"),
            Err(BencodeError::DuplicateKey { offset: 7, .. })
        ));
        assert!(matches!(
            decode(b"di1ei2ee"),
            Err(BencodeError::InvalidByte { offset: 1, byte: b'i' })
        ));
        assert_eq!(
            decode(b"d2:\xff\xfei1ee"),
            Err(BencodeError::KeyNotUtf8 { offset: 1 })
        );
    }

    #[test]
    fn enforces_depth_limit() {
        assert!(decode_with_limit(b"llee", 2).is_ok());
        assert_eq!(
            decode_with_limit(b"llleee", 2),
            Err(BencodeError::DepthExceeded {
                offset: 2,
                limit: 2
            })
        );
    }

    #[test]
    fn limits_above_the_supported_depth_are_capped() {
        let too_deep = nested_lists(MAX_SUPPORTED_DEPTH + 1);
        assert_eq!(
            decode_with_limit(&too_deep, usize::MAX),
            Err(BencodeError::DepthExceeded {
                offset: MAX_SUPPORTED_DEPTH,
                limit: MAX_SUPPORTED_DEPTH
            })
        );
    }

    #[test]
    fn deepest_supported_input_fits_a_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let input = nested_lists(MAX_SUPPORTED_DEPTH);
                let document = decode_with_limit(&input, MAX_SUPPORTED_DEPTH).expect("decoded");
                assert_eq!(document.depth(), MAX_SUPPORTED_DEPTH);
                assert_eq!(encode(&document), input);
            })
            .expect("spawned");
        handle.join().expect("no stack overflow");
    }

    fn nested_lists(depth: usize) -> Vec<u8> {
        let mut input = vec![b'l'; depth];
        input.extend(std::iter::repeat_n(b'e', depth));
        input
    }

    #[test]
    fn empty_containers_round_trip() {
        let input = b"d4:listle4:dictdee";
        let document = decode(input).expect("valid input");
        assert_eq!(document.get("list"), Some(&Document::list([])));
        assert_eq!(document.get("dict"), Some(&Document::dict::<String, _>([])));
        assert_eq!(encode(&document), input.to_vec());
    }
}
