//! Case folding of function names ahead of parsing.

/// Function names lower-cased by [`normalize_function_names`] when no other
/// list is supplied.
pub const DEFAULT_FUNCTIONS: &[&str] = &[
    "contains",
    "startswith",
    "endswith",
    "tolower",
    "toupper",
    "length",
    "indexof",
    "substring",
    "trim",
    "now",
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
    "date",
    "time",
    "floor",
    "ceiling",
    "round",
    "abs",
    "distance",
    "intersects",
];

/// Lower-case every identifier in `filter` that names a known function and is
/// followed by `(`. Text inside single-quoted strings is left alone.
#[must_use]
pub fn normalize_function_names<S: AsRef<str>>(filter: &str, known: &[S]) -> String {
    let mut out = String::with_capacity(filter.len());
    let mut in_string = false;
    let mut chars = filter.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c == '\'' {
            if in_string && chars.peek().is_some_and(|(_, next)| *next == '\'') {
                chars.next();
                out.push_str("''");
                continue;
            }
            in_string = !in_string;
            out.push(c);
            continue;
        }

        if in_string || !(c.is_alphabetic() || c == '_') {
            out.push(c);
            continue;
        }

        let mut end = start + c.len_utf8();
        while let Some((i, next)) = chars.peek().copied() {
            if !(next.is_alphanumeric() || next == '_') {
                break;
            }
            end = i + next.len_utf8();
            chars.next();
        }
        let ident = &filter[start..end];
        let is_call = filter[end..].trim_start().starts_with('(');
        if is_call && known.iter().any(|k| k.as_ref().eq_ignore_ascii_case(ident)) {
            out.push_str(&ident.to_lowercase());
        } else {
            out.push_str(ident);
        }
    }
    out
}
