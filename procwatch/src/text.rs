//! Text decoding helpers for the fixed-format files under `/proc`.
//!
//! These work on borrowed slices; nothing here allocates unless it has to.

use std::io;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Characters stripped by [`ltrim`] and [`rtrim`].
pub const WHITESPACE: &[char] = &[' ', '\n', '\r', '\t', '\x0C', '\x0B'];

/// Strip trailing whitespace.
pub fn rtrim(value: &str) -> &str {
    value.trim_end_matches(WHITESPACE)
}

/// Strip leading whitespace.
pub fn ltrim(value: &str) -> &str {
    value.trim_start_matches(WHITESPACE)
}

/// Strip whitespace on both ends.
pub fn trim(value: &str) -> &str {
    rtrim(ltrim(value))
}

/// Split `input` at the first character found in `delimiters`.
///
/// Both halves are trimmed. When no delimiter is present the whole input is
/// the left half and the right half is empty.
pub fn split_in_two<'a>(input: &'a str, delimiters: &str) -> (&'a str, &'a str) {
    match input.char_indices().find(|(_, c)| delimiters.contains(*c)) {
        Some((idx, c)) => (trim(&input[..idx]), trim(&input[idx + c.len_utf8()..])),
        None => (trim(input), ""),
    }
}

/// Split `input` on every `separator`, left-trimming each token.
///
/// A leading empty token (input starting with the separator) is dropped; a
/// trailing one is kept. Input without any separator yields one token, and
/// empty input yields none.
pub fn split(input: &str, separator: char) -> Vec<&str> {
    if input.is_empty() {
        return Vec::new();
    }

    let mut tokens: Vec<&str> = input.split(separator).map(ltrim).collect();
    if input.starts_with(separator) {
        tokens.remove(0);
    }
    tokens
}

/// True when `value` is non-empty and made only of ASCII digits.
pub fn is_number(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Trim then parse.
pub fn parse_trimmed<T: FromStr>(value: &str) -> Option<T> {
    trim(value).parse().ok()
}

/// Replace the first occurrence of `pattern`, or return `value` unchanged.
pub fn replace_first(value: &str, pattern: &str, replacement: &str) -> String {
    value.replacen(pattern, replacement, 1)
}

/// Read a whole file, logging and returning `None` when it cannot be read.
pub fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "unreadable source, using default");
            None
        }
    }
}

/// Read a file and concatenate its lines without terminators.
///
/// Returns an empty string when the file cannot be read.
pub fn read_joined_lines(path: &Path) -> String {
    read_optional(path)
        .map(|content| content.lines().collect())
        .unwrap_or_default()
}

/// Call `visitor` for every immediate subdirectory of `path` whose name is
/// entirely numeric. Returns how many entries were visited.
///
/// Entries that disappear or cannot be inspected mid-scan are skipped.
pub fn scan_numeric_subdirectories<F>(path: &Path, mut visitor: F) -> io::Result<usize>
where
    F: FnMut(&str),
{
    let mut visited = 0;
    for entry in std::fs::read_dir(path)? {
        let Ok(entry) = entry else { continue };
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        let name = entry.file_name();
        if let Some(name) = name.to_str()
            && is_number(name)
        {
            visitor(name);
            visited += 1;
        }
    }
    Ok(visited)
}
