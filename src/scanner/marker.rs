//! Matching of call-like sugar markers such as `::connected(` or `addChangeListener(`.

/// A marker occurrence that is followed by an opening parenthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallMarker {
    /// Offset of the first marker character
    pub start: usize,
    /// Offset of the `(` after the marker
    pub paren: usize,
}

/// Find the next `marker`, optional whitespace and `(` at or after `from`.
///
/// A marker only counts at the start of the script or right after whitespace, never in
/// the middle of an identifier. When `from_is_boundary` is set, an occurrence starting
/// exactly at `from` also counts (the text before it was cut away).
pub fn find_call(script: &str, from: usize, marker: &str, from_is_boundary: bool) -> Option<CallMarker> {
    if marker.is_empty() {
        return None;
    }
    let step = marker.chars().next().map_or(1, char::len_utf8);
    let mut pos = from;

    while let Some(rel) = script.get(pos..)?.find(marker) {
        let start = pos + rel;
        pos = start + step;

        let at_boundary = start == 0
            || (from_is_boundary && start == from)
            || script[..start].chars().next_back().is_some_and(char::is_whitespace);
        if !at_boundary {
            continue;
        }

        let after = start + marker.len();
        let paren = after + skip_whitespace(&script[after..]);
        if script[paren..].starts_with('(') {
            return Some(CallMarker { start, paren });
        }
    }

    None
}

/// End of an invocation whose handler block closes at `block_end`.
///
/// Consumes a trailing comma, the closing `)` of the call and a trailing `;` when
/// present. Whitespace is only consumed when it leads up to one of them.
pub fn invocation_end(script: &str, block_end: usize) -> usize {
    let mut end = block_end;
    let mut paren = end + skip_whitespace(&script[end..]);
    if script[paren..].starts_with(',') {
        paren += 1;
        paren += skip_whitespace(&script[paren..]);
    }
    if script[paren..].starts_with(')') {
        end = paren + 1;
        let semi = end + skip_whitespace(&script[end..]);
        if script[semi..].starts_with(';') {
            end = semi + 1;
        }
    }
    end
}

/// Offset of an argument passed after the handler block that closes at `block_end`.
///
/// A trailing comma right before the closing `)` is not an argument.
pub fn extra_argument(script: &str, block_end: usize) -> Option<usize> {
    let comma = block_end + skip_whitespace(&script[block_end..]);
    if !script[comma..].starts_with(',') {
        return None;
    }
    let arg = comma + 1 + skip_whitespace(&script[comma + 1..]);
    (!script[arg..].starts_with(')')).then_some(arg)
}

fn skip_whitespace(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_start() {
        let found = find_call("::connected() {}", 0, "::connected", false);
        assert_eq!(found, Some(CallMarker { start: 0, paren: 11 }));
    }

    #[test]
    fn test_after_whitespace_with_gap_before_paren() {
        let found = find_call("x;\n  ::connected  (", 0, "::connected", false).unwrap();
        assert_eq!(found.start, 5);
        assert_eq!(found.paren, 18);
    }

    #[test]
    fn test_not_inside_identifier() {
        assert_eq!(find_call("my::connected()", 0, "::connected", false), None);
        assert_eq!(find_call("xaddChangeListener(", 0, "addChangeListener", false), None);
    }

    #[test]
    fn test_requires_paren() {
        assert_eq!(find_call(" ::connected = 1", 0, "::connected", false), None);
    }

    #[test]
    fn test_skips_to_later_match() {
        let script = "a::connected() ::connected()";
        assert_eq!(find_call(script, 0, "::connected", false).map(|m| m.start), Some(15));
    }

    #[test]
    fn test_from_boundary() {
        let script = "})addChangeListener(";
        assert_eq!(find_call(script, 2, "addChangeListener", false), None);
        assert_eq!(find_call(script, 2, "addChangeListener", true).map(|m| m.start), Some(2));
    }

    #[test]
    fn test_invocation_end() {
        let script = "f(x => {}) ; next";
        assert_eq!(invocation_end(script, 9), 12);

        let script = "f(x => {}) next";
        assert_eq!(invocation_end(script, 9), 10);

        let script = "{} next";
        assert_eq!(invocation_end(script, 2), 2);

        let script = "f(x => {}, ); next";
        assert_eq!(invocation_end(script, 9), 13);
    }

    #[test]
    fn test_extra_argument() {
        let script = "f(x => {}, { once: true })";
        assert_eq!(extra_argument(script, 9), Some(11));
        assert_eq!(extra_argument("f(x => {} ,\n)", 9), None);
        assert_eq!(extra_argument("f(x => {})", 9), None);
        assert_eq!(extra_argument("f(x => {},", 9), Some(10));
    }
}
