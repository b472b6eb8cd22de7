//! Text-level helpers for editor-supplied source.

/// Make the last line of `code` the return value.
///
/// Returns the trimmed code with `return ` prepended to its last line, unless
/// that line already starts with `return` or is a `//` comment. `None` when
/// there is nothing but whitespace.
///
/// The compiler already treats a trailing expression statement as the return
/// value; this is for callers that hand the text to something stricter.
pub fn with_implicit_return(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    let (head, last) = match code.rfind('\n') {
        Some(i) => code.split_at(i + 1),
        None => ("", code),
    };
    let body = last.trim_start();
    if body.starts_with("return") || body.starts_with("//") {
        return Some(code.to_string());
    }
    let indent = &last[..last.len() - body.len()];
    Some(format!("{head}{indent}return {body}"))
}

/// The trimmed code up to and including line `line` (1-based).
///
/// `0` gives an empty string; a line past the end gives the whole code.
pub fn through_line(code: &str, line: usize) -> String {
    code.trim().lines().take(line).collect::<Vec<_>>().join("\n")
}
