use std::borrow::Cow;

/// Returns true for bytes that XML 1.0 cannot carry in character data.
///
/// Tab, newline and carriage return are the only C0 controls XML allows.
/// DEL is legal XML but never meaningful in feed text, so it goes too.
#[inline]
fn is_forbidden_control(b: u8) -> bool {
    b == 0x7f || (b < 0x20 && b != 0x09 && b != 0x0a && b != 0x0d)
}

/// Strips control characters that are not representable in an XML document.
///
/// Scraped pages occasionally carry stray NUL or form-feed bytes inside text
/// nodes; leaving them in would make the rendered feed unparsable by readers.
///
/// Returns `Cow::Borrowed` when the input is already clean (common case).
///
/// # Examples
///
/// ```
/// use pagefeed::util::strip_control_chars;
///
/// assert_eq!(strip_control_chars("he\x00llo"), "hello");
/// assert_eq!(strip_control_chars("tab\tkept"), "tab\tkept");
/// ```
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();

    // Fast path: nothing to strip
    if !bytes.iter().any(|&b| is_forbidden_control(b)) {
        return Cow::Borrowed(s);
    }

    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        if is_forbidden_control(bytes[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < len && !is_forbidden_control(bytes[i]) {
            i += 1;
        }
        // Control bytes are ASCII and never split a UTF-8 codepoint,
        // so s[start..i] is always a valid slice.
        out.push_str(&s[start..i]);
    }

    Cow::Owned(out)
}

/// Collapses every run of whitespace into a single space and trims both ends.
///
/// Serialized markup keeps the indentation of the source page; collapsing it
/// makes extracted values stable no matter how the page was formatted.
///
/// # Examples
///
/// ```
/// use pagefeed::util::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  a\n\t b  "), "a b");
/// ```
pub fn collapse_whitespace(s: &str) -> Cow<'_, str> {
    let trimmed = s.trim();
    let needs_collapse = trimmed
        .as_bytes()
        .windows(2)
        .any(|w| w[0].is_ascii_whitespace() && w[1].is_ascii_whitespace())
        || trimmed.chars().any(|c| c.is_whitespace() && c != ' ');

    if !needs_collapse {
        return Cow::Borrowed(trimmed);
    }

    let mut out = String::with_capacity(trimmed.len());
    for word in trimmed.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    Cow::Owned(out)
}

/// Unwraps a fragment that consists of exactly one bare `<p>…</p>`.
///
/// Cleaned fragments that were a single paragraph read better in feed readers
/// without the wrapper. Fragments with several paragraphs are left alone.
pub fn strip_paragraph_wrapper(s: &str) -> &str {
    match s.strip_prefix("<p>").and_then(|rest| rest.strip_suffix("</p>")) {
        Some(inner) if !inner.contains("<p") && !inner.contains("</p>") => inner,
        _ => s,
    }
}
