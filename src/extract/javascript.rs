//! Extracts gettext marker calls from JavaScript/TypeScript using Tree-sitter.

use std::iter::Peekable;
use std::str::Chars;

use tree_sitter::{
    Language,
    Node,
    Parser,
};

use super::collector::StringsCollector;
use super::error::ExtractionError;
use crate::config::MarkerConfig;
use crate::types::MessageContext;

/// Prefix of a translator comment line (`/// Shown on the login page`).
const TRANSLATOR_COMMENT_PREFIX: &str = "///";

/// Extracts text content from a tree-sitter node
fn node_text<'a>(node: Node<'_>, source_bytes: &'a [u8]) -> Option<&'a str> {
    node.utf8_text(source_bytes).ok()
}

/// Extracts every marker call of `source` into `collector`.
///
/// # Errors
/// Returns `ExtractionError` if:
/// - Language setup fails
/// - The source contains syntax errors
pub(super) fn extract_calls(
    source: &str,
    language: &Language,
    markers: &[MarkerConfig],
    reference_path: &str,
    collector: &mut StringsCollector,
) -> Result<(), ExtractionError> {
    let mut parser = Parser::new();
    parser.set_language(language)?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ExtractionError::ParseFailed { path: reference_path.to_string() })?;

    let root_node = tree.root_node();
    if root_node.has_error() {
        return Err(ExtractionError::ParseFailed { path: reference_path.to_string() });
    }

    let source_bytes = source.as_bytes();
    let mut stack = vec![root_node];

    while let Some(node) = stack.pop() {
        if node.kind() == "call_expression"
            && let Some(call) = match_marker_call(node, source_bytes, markers)
        {
            collector.add(
                &call.msgid,
                call.context,
                translator_comments(node, source_bytes),
                format!("{reference_path}:{}", call.line),
            );
        }

        let mut cursor = node.walk();
        stack.extend(node.named_children(&mut cursor));
    }

    Ok(())
}

/// A marker call whose msgid argument is a static string.
#[derive(Debug)]
struct MarkerCall {
    /// Static message id argument.
    msgid: String,
    /// Context argument, `None` if the marker has none or it is absent.
    context: MessageContext,
    /// 1-based line of the msgid argument
    line: usize,
}

/// Matches a `call_expression` against the markers.
fn match_marker_call(
    node: Node<'_>,
    source_bytes: &[u8],
    markers: &[MarkerConfig],
) -> Option<MarkerCall> {
    let callee = node.child_by_field_name("function")?;
    let callee: String =
        node_text(callee, source_bytes)?.chars().filter(|c| !c.is_whitespace()).collect();
    let marker = markers.iter().find(|marker| callee_matches(&marker.name, &callee))?;

    let args_node = node.child_by_field_name("arguments")?;
    let mut cursor = args_node.walk();
    let arguments: Vec<Node<'_>> =
        args_node.named_children(&mut cursor).filter(|arg| arg.kind() != "comment").collect();

    let msgid_node = *arguments.get(marker.msgid_index)?;
    let msgid = string_value(msgid_node, source_bytes)?;
    let context = marker
        .context_index
        .and_then(|index| arguments.get(index))
        .and_then(|arg| string_value(*arg, source_bytes));

    Some(MarkerCall {
        msgid,
        context: MessageContext::from_msgctxt(context.as_deref()),
        line: msgid_node.start_position().row + 1,
    })
}

/// `gettextCatalog.getString` also matches `this.gettextCatalog.getString`.
fn callee_matches(marker: &str, callee: &str) -> bool {
    callee == marker
        || (marker.contains('.')
            && callee.strip_suffix(marker).is_some_and(|prefix| prefix.ends_with('.')))
}

/// Evaluates a static string argument.
///
/// Supports string literals, templates without substitutions and `+`
/// concatenation of those. Anything else is not a static string.
fn string_value(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => {
            let mut value = String::new();
            let mut cursor = node.walk();
            for part in node.named_children(&mut cursor) {
                if matches!(part.kind(), "string_fragment" | "escape_sequence") {
                    value.push_str(node_text(part, source_bytes)?);
                }
            }
            // surrogate pairs span two escape sequences
            Some(unescape(&value))
        }
        "template_string" => {
            let mut cursor = node.walk();
            let mut parts = node.named_children(&mut cursor);
            if parts.any(|part| part.kind() == "template_substitution") {
                return None;
            }
            let raw = node_text(node, source_bytes)?;
            let inner = raw.strip_prefix('`')?.strip_suffix('`')?;
            Some(unescape(inner))
        }
        "binary_expression" => {
            let operator = node.child_by_field_name("operator")?;
            if node_text(operator, source_bytes)? != "+" {
                return None;
            }
            let left = string_value(node.child_by_field_name("left")?, source_bytes)?;
            let right = string_value(node.child_by_field_name("right")?, source_bytes)?;
            Some(left + &right)
        }
        "parenthesized_expression" => string_value(node.named_child(0)?, source_bytes),
        _ => None,
    }
}

/// Resolves backslash escapes of a JavaScript string.
///
/// Malformed `\x` and `\u` escapes are kept verbatim. A lone surrogate
/// becomes U+FFFD.
fn unescape(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            break;
        };
        match escape {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' if !chars.peek().is_some_and(char::is_ascii_digit) => value.push('\0'),
            'x' => match read_hex(&mut chars, 2).and_then(char::from_u32) {
                Some(code) => value.push(code),
                None => value.push_str("\\x"),
            },
            'u' => match read_unicode_escape(&mut chars) {
                Some(code) => value.push(code),
                None => value.push_str("\\u"),
            },
            // line continuations
            '\r' => {
                chars.next_if_eq(&'\n');
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => value.push(other),
        }
    }

    value
}

/// Reads exactly `len` hex digits. Nothing is consumed on failure.
fn read_hex(chars: &mut Peekable<Chars<'_>>, len: usize) -> Option<u32> {
    let mut lookahead = chars.clone();
    let mut code = 0;
    for _ in 0..len {
        code = code * 16 + lookahead.next()?.to_digit(16)?;
    }
    *chars = lookahead;
    Some(code)
}

/// Reads the rest of a `\u` escape: `HHHH`, `{H..}` or a `\uHHHH\uHHHH` surrogate pair.
/// Nothing is consumed on failure.
fn read_unicode_escape(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    if chars.peek() == Some(&'{') {
        let mut lookahead = chars.clone();
        lookahead.next();
        let mut code: u32 = 0;
        let mut digits = 0;
        loop {
            let c = lookahead.next()?;
            if c == '}' {
                break;
            }
            code = code.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
            digits += 1;
        }
        if digits == 0 {
            return None;
        }
        *chars = lookahead;
        return Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    let high = read_hex(chars, 4)?;
    if !(0xD800..0xDC00).contains(&high) {
        return Some(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    let mut lookahead = chars.clone();
    let low = (lookahead.next() == Some('\\') && lookahead.next() == Some('u'))
        .then(|| read_hex(&mut lookahead, 4))
        .flatten()
        .filter(|low| (0xDC00..0xE000).contains(low));
    let Some(low) = low else {
        return Some(char::REPLACEMENT_CHARACTER);
    };
    *chars = lookahead;
    char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
}

/// Collects `///` comments directly above the call or one of its ancestors,
/// up to the enclosing statement.
fn translator_comments(node: Node<'_>, source_bytes: &[u8]) -> Vec<String> {
    let mut current = node;

    loop {
        let comments = leading_comments(current, source_bytes);
        if !comments.is_empty() {
            return comments;
        }

        let Some(parent) = current.parent() else {
            break;
        };
        if matches!(parent.kind(), "program" | "statement_block" | "class_body") {
            break;
        }
        current = parent;
    }

    Vec::new()
}

/// `///` comments immediately preceding `node`, in source order.
fn leading_comments(node: Node<'_>, source_bytes: &[u8]) -> Vec<String> {
    let mut comments = Vec::new();
    let mut sibling = node.prev_sibling();

    while let Some(prev) = sibling {
        if prev.kind() != "comment" {
            break;
        }
        let Some(comment) =
            node_text(prev, source_bytes).and_then(|t| t.strip_prefix(TRANSLATOR_COMMENT_PREFIX))
        else {
            break;
        };
        comments.push(comment.trim().to_string());
        sibling = prev.prev_sibling();
    }

    comments.reverse();
    comments
}
