//! Bijective-enough mapping between an integration ID and the filename used
//! to persist its log lines.
//!
//! The mapping is *not* a true bijection over arbitrary strings: an ID that
//! contains an underscore immediately before a colon-free tail will not
//! round-trip. That is accepted. Producers always name integrations
//! `logical-name:instance`, with exactly one colon, so the rightmost
//! underscore in the encoded filename is always the one we introduced.

const SUFFIX: &str = ".log";

/// Encode an integration ID as a filename stem ending in `.log`.
///
/// Every `:` becomes `_`; nothing else is altered.
pub fn id_to_filename(id: &str) -> String {
    let mut out = id.replace(':', "_");
    out.push_str(SUFFIX);
    out
}

/// Decode a filename (as produced by [`id_to_filename`], or found on disk)
/// back into an integration ID.
///
/// `tail` is the substring after the *last* `_` in the stem; the rest becomes
/// `head`. The decoded ID is `head:tail`. If the stem has no `_` at all, the
/// decoded ID is just the stem, with no colon.
pub fn filename_to_id(filename: &str) -> String {
    let stem = filename.strip_suffix(SUFFIX).unwrap_or(filename);
    match stem.rsplit_once('_') {
        Some((head, tail)) => format!("{head}:{tail}"),
        None => stem.to_string(),
    }
}
