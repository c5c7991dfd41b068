use crate::format::SHEBANG;

/// Longest stretch of a line that is searched for markers.
pub const MAX_LINE_LEN: usize = 1024;

/// Substrings that mark a script as dgsh-aware when they appear on its
/// interpreter line or on the line after it.
pub const MARKERS: [&[u8]; 3] = [b"dgsh-wrap", b"--dgsh", b"env dgsh"];

/// Re-exec marker recognised at the very start of the second line.
pub const MAGIC_LINE: &[u8] = b"#!dgsh";

const INTERPRETER: &[u8] = b"dgsh";

/// Returns true if the script in `data` declares itself dgsh-compatible.
///
/// The dgsh interpreter on the `#!` line only counts when a body follows it.
pub fn scan_script(data: &[u8]) -> bool {
    let Some(newline) = data.iter().position(|&b| b == b'\n') else {
        log::trace!("script has no line break");
        return false;
    };
    let shebang = &data[..newline];
    let body = &data[newline + 1..];

    (!body.is_empty() && runs_dgsh_interpreter(shebang))
        || MARKERS
            .iter()
            .any(|marker| line_contains(data, marker) || line_contains(body, marker))
        || body.starts_with(MAGIC_LINE)
}

/// Searches the first line of `haystack`, clamped to [`MAX_LINE_LEN`] bytes.
fn line_contains(haystack: &[u8], needle: &[u8]) -> bool {
    let window = &haystack[..haystack.len().min(MAX_LINE_LEN)];
    let line = match window.iter().position(|&b| b == b'\n') {
        Some(end) => &window[..end],
        None => window,
    };
    !needle.is_empty() && line.windows(needle.len()).any(|w| w == needle)
}

/// True for `#!dgsh`, `#! /usr/local/bin/dgsh -x` and the like.
fn runs_dgsh_interpreter(shebang: &[u8]) -> bool {
    let Some(directive) = shebang.strip_prefix(SHEBANG) else {
        return false;
    };
    let directive = &directive[..directive.len().min(MAX_LINE_LEN)];
    let Some(start) = directive.iter().position(|&b| !is_blank(b)) else {
        return false;
    };
    let program = directive[start..]
        .split(|&b| is_blank(b) || b == b'\r')
        .next()
        .unwrap_or_default();

    program.rsplit(|&b| b == b'/').next() == Some(INTERPRETER)
}

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
