//! Extraction of the operation body from a raw GraphQL request.
//!
//! This is deliberately not a GraphQL parser. The request text is scanned for
//! the first `mutation` or `query` keyword and the brace-delimited block that
//! follows it; a second pass over the block approximates the number of
//! top-level selections. Fragments, variables, and nested operations are not
//! handled beyond plain brace matching.

/// Delimiter used when counting top-level pairs: a closing brace followed by
/// a literal backslash-n, as escaped newlines appear in JSON-encoded bodies.
const PAIR_DELIMITER: &str = r"}\n";

/// Extract the content of the first `mutation` or `query` block.
///
/// The earlier of the two keywords wins. From the keyword, the first `{`
/// opens the block; a depth-counting scan finds the matching `}`. Returns the
/// trimmed text strictly between the braces, or `None` when the keyword, the
/// opening brace, or the matching closing brace is missing.
pub fn extract_operation_content(input: &str) -> Option<&str> {
    let keyword_index = match (input.find("mutation"), input.find("query")) {
        (Some(mutation), Some(query)) => mutation.min(query),
        (Some(mutation), None) => mutation,
        (None, Some(query)) => query,
        (None, None) => return None,
    };

    let opening_brace = keyword_index + input.get(keyword_index..)?.find('{')?;
    let closing_brace = find_closing_brace(input, opening_brace)?;

    input
        .get(opening_brace + 1..closing_brace)
        .map(str::trim)
}

/// Find the index of the brace matching the one at `opening_brace`, tracking
/// nested pairs with an explicit depth counter. `None` if the input ends
/// before the depth returns to zero.
fn find_closing_brace(input: &str, opening_brace: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, ch) in input.get(opening_brace + 1..)?.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(opening_brace + 1 + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Approximate the number of top-level pairs in extracted operation content.
///
/// Splits on the literal `}\n` sequence and counts trimmed segments that are
/// non-empty and contain a colon. The delimiter only occurs in bodies that
/// carry escaped newlines rather than real line breaks, so text with real
/// newlines collapses into a single segment. The count is a logging
/// heuristic, not a GraphQL field count.
pub fn count_top_level_pairs(content: &str) -> usize {
    content
        .split(PAIR_DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && segment.contains(':'))
        .count()
}
