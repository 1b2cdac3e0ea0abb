//! Comment removal ahead of translation.

use super::offsets::{OffsetMap, Rewriter};

/// Remove `//` line comments and `/* */` block comments.
///
/// Literal text inside `'...'`, `"..."` and `` `...` `` is kept as written, and a
/// backslash-escaped `\//` or `\/*` is not a comment. A block comment collapses to the
/// newlines it spanned (or a single space), so line numbers survive and no new comment
/// opener can be formed by joining its neighbours. An unterminated block comment runs
/// to the end of the script.
///
/// Regex literals are not recognised: a quote inside one starts a string.
pub fn strip_comments(script: &str) -> String {
    strip_comments_mapped(script).0
}

/// [`strip_comments`], also returning the map back to `script`
pub fn strip_comments_mapped(script: &str) -> (String, OffsetMap) {
    let bytes = script.as_bytes();
    let mut rewriter = Rewriter::new(script);
    let mut quote: Option<u8> = None;
    let mut kept = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if let Some(q) = quote {
            match b {
                b'\\' => i += 2,
                _ if b == q => {
                    quote = None;
                    i += 1;
                }
                _ => i += 1,
            }
            continue;
        }

        match (b, bytes.get(i + 1)) {
            (b'\\', _) => i += 2,
            (b'"' | b'\'' | b'`', _) => {
                quote = Some(b);
                i += 1;
            }
            (b'/', Some(b'/')) => {
                rewriter.copy(kept..i);
                i = script[i..].find('\n').map_or(bytes.len(), |n| i + n);
                kept = i;
            }
            (b'/', Some(b'*')) => {
                rewriter.copy(kept..i);
                match script[i + 2..].find("*/") {
                    Some(n) => {
                        let end = i + 2 + n + 2;
                        let newlines = script[i..end].matches('\n').count();
                        if newlines == 0 {
                            rewriter.insert(" ", i);
                        } else {
                            rewriter.insert(&"\n".repeat(newlines), i);
                        }
                        i = end;
                    }
                    None => i = bytes.len(),
                }
                kept = i;
            }
            _ => i += 1,
        }
    }

    if kept < bytes.len() {
        rewriter.copy(kept..bytes.len());
    }
    rewriter.finish()
}
