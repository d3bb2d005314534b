//! Pull routing information out of individual `listen` log lines.
//!
//! Lines may carry any prefix (syslog host, timestamps, port names); the
//! matchers look for their keywords anywhere in the line:
//!
//! ```text
//! Oct 19 12:34:56 gw ax25d: ax0: fm N0CALL-7 to APRS via DIGI1* WIDE2-1 ctl UI^ pid=F0(Text) len 42
//! ```
//!
//! Keywords are matched case-insensitively and must sit on word boundaries,
//! so `via` inside `viaduct` or `len` inside `lenny` never match.

use super::types::{LineRoute, PathHop};

/// Lines containing this marker are hex-dump payload lines, not headers.
const HEX_DUMP_MARKER: &str = ": 0000 ";

/// Punctuation stripped from both ends of every via-path token.
const PATH_PUNCTUATION: &[char] = &[',', ';', ':', '/', '(', ')', '[', ']', '{', '}'];

/// Extract the source callsign and the via segment from a log line.
///
/// # Parameters
///
/// * `line` - A single decoded log line, without its line terminator
///
/// # Returns
///
/// A [`LineRoute`] with `source` set when an `fm <SRC> to <DST>` header was
/// found and `via` set when the `via` keyword was found. Hex-dump lines
/// produce an empty route.
pub fn extract_route(line: &str) -> LineRoute<'_> {
    if line.contains(HEX_DUMP_MARKER) {
        return LineRoute::default();
    }

    LineRoute {
        source: fm_headers(line).next().map(|(source, _)| source),
        via: find_via_segment(line),
    }
}

/// Split a via segment into path tokens.
///
/// Tokens are separated by whitespace or commas, then trimmed of
/// [`PATH_PUNCTUATION`]. Relay markers (`*`) are kept on the token.
pub fn tokenize_path(segment: &str) -> Vec<PathHop<'_>> {
    segment
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| token.trim_matches(PATH_PUNCTUATION))
        .filter(|token| !token.is_empty())
        .map(|raw| PathHop { raw })
        .collect()
}

/// Fold a callsign onto its base call unless `keep_ssid` is set.
///
/// `N0CALL-5` becomes `N0CALL`; a callsign without `-` is returned as is.
pub fn normalize_callsign(raw: &str, keep_ssid: bool) -> &str {
    if keep_ssid {
        return raw;
    }
    match raw.find('-') {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

/// Iterate over every `fm <SRC> to <DST>` header in the line, leftmost first.
///
/// Yields `(source, destination)` token pairs.
pub(crate) fn fm_headers(line: &str) -> impl Iterator<Item = (&str, &str)> {
    line.char_indices().filter_map(move |(idx, _)| {
        if keyword_at(line, idx, "fm") && is_boundary(line, idx) {
            match_header_tail(line, idx + 2)
        } else {
            None
        }
    })
}

/// Match `\s+SRC\s+to\s+DST` starting right after an `fm` keyword.
fn match_header_tail(line: &str, idx: usize) -> Option<(&str, &str)> {
    let src_start = skip_whitespace(line, idx);
    if src_start == idx {
        return None;
    }
    let (source, src_end) = take_token(line, src_start)?;

    let to_start = skip_whitespace(line, src_end);
    if to_start == src_end || !keyword_at(line, to_start, "to") {
        return None;
    }

    let dst_start = skip_whitespace(line, to_start + 2);
    if dst_start == to_start + 2 {
        return None;
    }
    let (destination, _) = take_token(line, dst_start)?;

    Some((source, destination))
}

/// Find the text between `via` and the nearest terminator keyword.
fn find_via_segment(line: &str) -> Option<&str> {
    let via = line
        .char_indices()
        .map(|(idx, _)| idx)
        .find(|&idx| keyword_at(line, idx, "via") && is_boundary(line, idx) && is_boundary(line, idx + 3))?;

    let start = via + 3;
    let end = line[start..]
        .char_indices()
        .map(|(offset, _)| start + offset)
        .find(|&idx| is_via_terminator(line, idx))
        .unwrap_or(line.len());

    Some(&line[start..end])
}

/// True if `ctl`, `len` or `pid=` starts at `idx`.
fn is_via_terminator(line: &str, idx: usize) -> bool {
    if !is_boundary(line, idx) {
        return false;
    }

    for keyword in ["ctl", "len"] {
        if keyword_at(line, idx, keyword) && is_boundary(line, idx + keyword.len()) {
            return true;
        }
    }

    if keyword_at(line, idx, "pid") {
        let eq = skip_whitespace(line, idx + 3);
        // `=` must be followed by a word character
        return line[eq..].starts_with('=') && is_boundary(line, eq + 1);
    }

    false
}

/// Case-insensitive match of an ASCII keyword at byte offset `idx`.
pub(crate) fn keyword_at(line: &str, idx: usize, keyword: &str) -> bool {
    line.as_bytes()
        .get(idx..idx + keyword.len())
        .is_some_and(|bytes| bytes.eq_ignore_ascii_case(keyword.as_bytes()))
}

/// Regex-style `\b`: exactly one side of `idx` is a word character.
pub(crate) fn is_boundary(line: &str, idx: usize) -> bool {
    let before = line[..idx].chars().next_back().is_some_and(is_word_char);
    let after = line[idx..].chars().next().is_some_and(is_word_char);
    before != after
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offset of the first non-whitespace character at or after `idx`.
pub(crate) fn skip_whitespace(line: &str, idx: usize) -> usize {
    line[idx..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(offset, _)| idx + offset)
        .unwrap_or(line.len())
}

/// Take a non-empty run of non-whitespace starting at `idx`.
pub(crate) fn take_token(line: &str, idx: usize) -> Option<(&str, usize)> {
    let end = line[idx..]
        .char_indices()
        .find(|(_, c)| c.is_whitespace())
        .map(|(offset, _)| idx + offset)
        .unwrap_or(line.len());

    if end == idx { None } else { Some((&line[idx..end], end)) }
}
