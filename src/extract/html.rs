//! Extracts `translate` annotated elements from HTML templates.

use tree_sitter::{
    Language,
    Node,
    Parser,
};

use super::collector::StringsCollector;
use super::error::ExtractionError;
use crate::types::MessageContext;

/// Attribute marking an element as translatable.
const TRANSLATE_ATTRIBUTE: &str = "translate";
/// Element whose whole content is translatable.
const TRANSLATE_ELEMENT: &str = "translate";
/// Attribute carrying the message context.
const CONTEXT_ATTRIBUTE: &str = "translate-context";
/// Attribute carrying a translator comment.
const COMMENT_ATTRIBUTE: &str = "translate-comment";

/// Extracts every translatable element of `source` into `collector`.
///
/// Templates are often partial documents, so recoverable syntax errors are
/// tolerated and only the well-formed elements are extracted.
///
/// # Errors
/// Returns `ExtractionError` if the grammar cannot be loaded or parsing fails.
pub(super) fn extract_elements(
    source: &str,
    language: &Language,
    reference_path: &str,
    collector: &mut StringsCollector,
) -> Result<(), ExtractionError> {
    let mut parser = Parser::new();
    parser.set_language(language)?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ExtractionError::ParseFailed { path: reference_path.to_string() })?;

    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.kind() == "element"
            && let Some(element) = translatable_element(node, source)
        {
            collector.add(
                &element.msgid,
                element.context,
                element.comment,
                format!("{reference_path}:{}", element.line),
            );
            continue;
        }

        let mut cursor = node.walk();
        stack.extend(node.named_children(&mut cursor));
    }

    Ok(())
}

/// A translatable element found in a template.
#[derive(Debug)]
struct TranslatableElement {
    /// Trimmed inner text.
    msgid: String,
    /// From `translate-context`.
    context: MessageContext,
    /// From `translate-comment`.
    comment: Option<String>,
    /// 1-based line of the start tag.
    line: usize,
}

/// Reads `node` as a translatable element, if it is one.
fn translatable_element(node: Node<'_>, source: &str) -> Option<TranslatableElement> {
    let mut cursor = node.walk();
    let start_tag = node.named_children(&mut cursor).find(|child| child.kind() == "start_tag")?;
    let attributes = tag_attributes(start_tag, source);

    let tag_name = {
        let mut cursor = start_tag.walk();
        start_tag
            .named_children(&mut cursor)
            .find(|child| child.kind() == "tag_name")
            .and_then(|name| source.get(name.byte_range()))
    };
    let is_marked = tag_name.is_some_and(|name| name.eq_ignore_ascii_case(TRANSLATE_ELEMENT))
        || attributes.iter().any(|(name, _)| name == TRANSLATE_ATTRIBUTE);
    if !is_marked {
        return None;
    }

    let mut cursor = node.walk();
    let end_tag =
        node.named_children(&mut cursor).filter(|child| child.kind() == "end_tag").last()?;
    let msgid = source.get(start_tag.end_byte()..end_tag.start_byte())?.trim().to_string();

    let attribute = |wanted: &str| {
        attributes
            .iter()
            .find(|(name, _)| name == wanted)
            .map(|(_, value)| value.clone())
            .filter(|value| !value.is_empty())
    };

    Some(TranslatableElement {
        msgid,
        context: MessageContext::from_msgctxt(attribute(CONTEXT_ATTRIBUTE).as_deref()),
        comment: attribute(COMMENT_ATTRIBUTE),
        line: start_tag.start_position().row + 1,
    })
}

/// Attribute names (lowercased) with their unquoted values.
fn tag_attributes(start_tag: Node<'_>, source: &str) -> Vec<(String, String)> {
    let mut cursor = start_tag.walk();
    start_tag
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "attribute")
        .filter_map(|attribute| {
            let mut cursor = attribute.walk();
            let mut name = None;
            let mut value = String::new();
            for part in attribute.named_children(&mut cursor) {
                match part.kind() {
                    "attribute_name" => name = source.get(part.byte_range()),
                    "attribute_value" => value = source.get(part.byte_range())?.to_string(),
                    "quoted_attribute_value" => {
                        let mut inner = part.walk();
                        value = part
                            .named_children(&mut inner)
                            .find(|v| v.kind() == "attribute_value")
                            .and_then(|v| source.get(v.byte_range()))
                            .unwrap_or_default()
                            .to_string();
                    }
                    _ => {}
                }
            }
            Some((name?.to_ascii_lowercase(), value))
        })
        .collect()
}
