//! Plain-text reconstruction for contenteditable editors.
//!
//! Rendered `innerText` is fine for snapshots, but resolving a caret to an
//! absolute offset needs the text as the walk sees it: text nodes in
//! document order, with a newline for each block boundary. The DOM layer
//! feeds the walk as a sequence of [`WalkStep`]s.

/// Element names that start a new line in the reconstruction.
pub const BLOCK_ELEMENTS: &[&str] = &["DIV", "P"];

/// One node visited by a document-order walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkStep {
    /// A text node. `stop_at` marks the walk's boundary node: only the first
    /// `stop_at` UTF-16 units are kept and the walk ends there.
    Text {
        content: String,
        stop_at: Option<usize>,
    },
    /// A block-level element boundary.
    Block {
        has_previous_sibling: bool,
        parent_is_root: bool,
    },
}

impl WalkStep {
    pub fn text(content: impl Into<String>) -> Self {
        WalkStep::Text {
            content: content.into(),
            stop_at: None,
        }
    }

    pub fn boundary(content: impl Into<String>, offset: usize) -> Self {
        WalkStep::Text {
            content: content.into(),
            stop_at: Some(offset),
        }
    }

    pub fn block(has_previous_sibling: bool, parent_is_root: bool) -> Self {
        WalkStep::Block {
            has_previous_sibling,
            parent_is_root,
        }
    }
}

/// Check if a node name is a block boundary.
pub fn is_block_element(node_name: &str) -> bool {
    BLOCK_ELEMENTS
        .iter()
        .any(|name| name.eq_ignore_ascii_case(node_name))
}

/// Concatenate a walk into text, emitting a newline before each block
/// boundary except when it would be the very first content.
pub fn reconstruct_with_newlines(steps: impl IntoIterator<Item = WalkStep>) -> String {
    let mut text = String::new();

    for step in steps {
        match step {
            WalkStep::Text {
                content,
                stop_at: Some(offset),
            } => {
                text.push_str(crate::text::utf16_prefix(&content, offset));
                break;
            }
            WalkStep::Text {
                content,
                stop_at: None,
            } => text.push_str(&content),
            WalkStep::Block {
                has_previous_sibling,
                parent_is_root,
            } => {
                if has_previous_sibling || !parent_is_root || !text.is_empty() {
                    text.push('\n');
                }
            }
        }
    }

    text
}

/// UTF-16 length of the reconstruction, i.e. an absolute caret offset when
/// the walk ends at the caret's boundary node.
pub fn offset_of(steps: impl IntoIterator<Item = WalkStep>) -> usize {
    crate::text::utf16_len(&reconstruct_with_newlines(steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_nodes_concatenate() {
        let steps = vec![WalkStep::text("hello "), WalkStep::text("world")];
        assert_eq!(reconstruct_with_newlines(steps), "hello world");
    }

    #[test]
    fn test_no_leading_newline_for_first_block() {
        let steps = vec![
            WalkStep::block(false, true),
            WalkStep::text("first"),
            WalkStep::block(true, true),
            WalkStep::text("second"),
        ];
        assert_eq!(reconstruct_with_newlines(steps), "first\nsecond");
    }

    #[test]
    fn test_nested_block_always_breaks() {
        // A block nested below the root breaks even with no text yet.
        let steps = vec![WalkStep::block(false, false), WalkStep::text("inner")];
        assert_eq!(reconstruct_with_newlines(steps), "\ninner");
    }

    #[test]
    fn test_boundary_truncates_and_stops() {
        let steps = vec![
            WalkStep::text("abc"),
            WalkStep::block(true, true),
            WalkStep::boundary("defgh", 2),
            WalkStep::text("never"),
        ];
        assert_eq!(reconstruct_with_newlines(steps.clone()), "abc\nde");
        assert_eq!(offset_of(steps), 6);
    }

    #[test]
    fn test_boundary_offset_counts_utf16() {
        let steps = vec![WalkStep::boundary("😀xy", 3)];
        assert_eq!(reconstruct_with_newlines(steps), "😀x");
    }

    #[test]
    fn test_is_block_element() {
        assert!(is_block_element("DIV"));
        assert!(is_block_element("p"));
        assert!(!is_block_element("SPAN"));
    }
}
