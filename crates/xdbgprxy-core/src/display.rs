//! Human-readable views of relayed chunks.
//!
//! Everything here works on a borrowed copy of the chunk and returns a fresh
//! `String`; the bytes written to the peer are never touched.

use crate::relay::Side;

/// DBGp separates IDE commands with NUL bytes.
const DBGP_SEPARATOR: u8 = 0;

/// How a forwarded chunk should be shown on the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkView {
    /// Printable payload text.
    Full(String),
    /// Only the payload size in bytes.
    Summary(usize),
}

/// Render IDE -> PHP traffic for display: every NUL separator becomes a
/// newline and surrounding newlines are trimmed.
pub fn display_payload(chunk: &[u8]) -> String {
    let replaced: Vec<u8> = chunk
        .iter()
        .map(|&b| if b == DBGP_SEPARATOR { b'\n' } else { b })
        .collect();
    String::from_utf8_lossy(&replaced)
        .trim_matches('\n')
        .to_string()
}

/// Pick the console view of a chunk read from `from`.
///
/// PHP -> IDE payloads are large XML documents and are only printed in
/// full when `verbose` is set. IDE -> PHP commands are short and always
/// printed.
pub fn view_chunk(from: Side, chunk: &[u8], verbose: bool) -> ChunkView {
    match from {
        Side::Php if verbose => ChunkView::Full(String::from_utf8_lossy(chunk).into_owned()),
        Side::Php => ChunkView::Summary(chunk.len()),
        Side::Ide => ChunkView::Full(display_payload(chunk)),
    }
}
