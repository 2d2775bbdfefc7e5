//! Bidirectional encoding between a normalized DN and a filesystem path.
//!
//! Encoding is one-way in the literal sense: the core never decodes a path
//! back into a DN. It reconstructs DNs from entry-file contents during
//! descent (see [`crate::enumerator`]). What this module guarantees is that
//! the mapping from DN to path is injective, so two distinct DNs under the
//! same suffix can never collide on disk.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::dn::Dn;

/// Suffix appended to every entry file.
pub const LDIF_SUFFIX: &str = ".ldif";

/// The character used to introduce a hex escape, and to escape itself when
/// it isn't `\`.
#[cfg(not(windows))]
pub const ESCAPE_CHAR: u8 = b'\\';
#[cfg(windows)]
pub const ESCAPE_CHAR: u8 = b'^';

/// Bytes that are unsafe in a path component on this platform, beyond the
/// ones every platform treats specially (`\`, `.`, `{`, `}`, handled by
/// [`needs_escape`] itself).
fn platform_unsafe(byte: u8) -> bool {
    #[cfg(not(windows))]
    {
        byte == b'/' || byte == b':'
    }
    #[cfg(windows)]
    {
        matches!(byte, b'/' | b':' | b'<' | b'>' | b'"' | b'|' | b'?' | b'*')
    }
}

/// `true` iff `byte` must be hex-escaped when encoding an RDN segment.
///
/// Besides the platform-unsafe set, `.` is always escaped (so a DN ending in
/// literal `.ldif` can't collide with the entry-file naming convention), and
/// a literal `\` is escaped whenever the escape character isn't `\` itself
/// (otherwise `\` and the escape character would map to the same output
/// byte, breaking injectivity).
fn needs_escape(byte: u8) -> bool {
    if platform_unsafe(byte) || byte == b'.' {
        return true;
    }
    if byte == b'\\' && ESCAPE_CHAR != b'\\' {
        return true;
    }
    false
}

/// Encode one RDN's bytes into a single filesystem-safe path component.
///
/// `{` and `}` pass through unchanged (they carry the ordered-RDN numbering
/// that [`ordered_rdn_key`] later needs to find).
fn encode_segment(rdn: &str) -> String {
    let mut out = String::with_capacity(rdn.len());
    for &byte in rdn.as_bytes() {
        if byte == b'\\' && ESCAPE_CHAR != b'\\' {
            out.push(ESCAPE_CHAR as char);
        } else if byte == b'{' || byte == b'}' {
            out.push(byte as char);
        } else if needs_escape(byte) {
            out.push(ESCAPE_CHAR as char);
            out.push_str(&format!("{byte:02X}"));
        } else {
            out.push(byte as char);
        }
    }
    out
}

/// Encode a normalized DN (known to carry the backend's configured suffix)
/// into an absolute entry-file path under `base_dir`.
///
/// The suffix is emitted as a single opaque path segment even if it is
/// itself a multi-RDN DN; everything leaf-ward of the suffix gets one path
/// segment per RDN.
pub fn encode(base_dir: &Path, suffix: &Dn, dn: &Dn) -> PathBuf {
    debug_assert!(dn.has_suffix(suffix), "dn must carry the backend suffix");

    let mut path = base_dir.to_path_buf();
    let above_suffix = dn.len() - suffix.len();

    if !suffix.is_root() {
        path.push(encode_segment(&suffix.to_string()));
    }
    for rdn in dn.components()[..above_suffix].iter().rev() {
        path.push(encode_segment(rdn));
    }

    let mut file_name = path.file_name().unwrap_or_default().to_os_string();
    file_name.push(LDIF_SUFFIX);
    path.set_file_name(file_name);
    path
}

/// The subtree directory that holds `path`'s children: `path` with the
/// trailing `.ldif` stripped.
pub fn parent_dir(path: &Path) -> PathBuf {
    sibling_pair(path).1
}

/// The `(entry_file, subtree_dir)` pair for an encoded entry path. Accepts
/// either half and returns both, so callers don't need to track which one
/// they started with.
pub fn sibling_pair(path: &Path) -> (PathBuf, PathBuf) {
    let s = path.to_string_lossy();
    if let Some(stripped) = s.strip_suffix(LDIF_SUFFIX) {
        (path.to_path_buf(), PathBuf::from(stripped))
    } else {
        let mut file = s.into_owned();
        file.push_str(LDIF_SUFFIX);
        (PathBuf::from(file), path.to_path_buf())
    }
}

/// Ordered-RDN key extracted from a single encoded path segment.
///
/// A segment is "ordered" iff it has an unescaped `{` followed later by a
/// `}` whose enclosed bytes parse as a decimal integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedKey {
    /// Text before the `{`, or the whole segment if unordered.
    pub prefix: String,
    /// The parsed number, if this segment is ordered.
    pub number: Option<i64>,
    /// Text from the `}` onward (inclusive), or empty if unordered.
    pub suffix: String,
}

/// Parse the ordered-RDN key out of one encoded segment (a filename, with or
/// without its `.ldif` suffix — the `{N}` marker is unaffected either way).
pub fn ordered_rdn_key(segment: &str) -> OrderedKey {
    if let Some(open) = segment.find('{') {
        if let Some(close_rel) = segment[open..].find('}') {
            let close = open + close_rel;
            let digits = &segment[open + 1..close];
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(number) = digits.parse::<i64>() {
                    return OrderedKey {
                        prefix: segment[..open].to_string(),
                        number: Some(number),
                        suffix: segment[close..].to_string(),
                    };
                }
            }
        }
    }
    OrderedKey {
        prefix: segment.to_string(),
        number: None,
        suffix: String::new(),
    }
}

/// Compare two encoded sibling segments per the ordered-RDN sort rule:
/// numeric by `{N}` among ordered peers sharing a prefix, lexicographic
/// otherwise, with prefix compared first so ordered and unordered peers
/// interleave sensibly.
pub fn compare_segments(a: &str, b: &str) -> Ordering {
    let ka = ordered_rdn_key(a);
    let kb = ordered_rdn_key(b);
    match ka.prefix.cmp(&kb.prefix) {
        Ordering::Equal => {}
        other => return other,
    }
    match (ka.number, kb.number) {
        (Some(na), Some(nb)) => match na.cmp(&nb) {
            Ordering::Equal => ka.suffix.cmp(&kb.suffix),
            other => other,
        },
        (None, None) => a.cmp(b),
        // One side has a numbered key and the other doesn't but shares the
        // same prefix: the unordered form sorts as if its "number" were
        // absent text, so fall back to the raw segment comparison.
        _ => a.cmp(b),
    }
}
