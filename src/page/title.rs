// src/page/title.rs
// =============================================================================
// This module finds a page's <title>.
//
// We use the `scraper` crate which:
// - Parses HTML into a tree of nodes (elements, text, comments...)
// - Is built on html5ever (Mozilla's HTML parser)
// - Never fails: broken markup is repaired the way browsers repair it
//
// Rather than a CSS selector, we walk the tree ourselves, depth-first and
// in document order, and stop at the first <title> element we meet.
//
// Rule: the FIRST <title> element decides. If it is empty, the answer is
// "" even if another <title> shows up later in the document.
//
// Rust concepts:
// - Explicit stack: A Vec used instead of recursion, so a page with
//   thousands of nested tags can't overflow the call stack
// - Option chaining: and_then / map to dig into the first child
// =============================================================================

use scraper::{ElementRef, Html};

// Extracts the title from a parsed document
//
// Example:
//   "<html><head><title>  Hello  </title></head></html>" -> "Hello"
pub fn title_of(document: &Html) -> String {
    extract_title(document.root_element())
}

// Extracts the title from the subtree under `root`
//
// Parameters:
//   root: the element to start from (usually <html>)
//
// Returns: the trimmed text of the first <title> element's first child,
//          or "" if there is no <title> or it has no text
pub fn extract_title(root: ElementRef<'_>) -> String {
    let mut stack = vec![root];

    while let Some(element) = stack.pop() {
        if element.value().name() == "title" {
            return title_text(element);
        }

        // Push children in reverse so the first child is popped first,
        // which keeps the walk in document order.
        // Text and comment nodes can't be <title>, so only elements go in.
        for child in element.children().rev() {
            if let Some(child) = ElementRef::wrap(child) {
                stack.push(child);
            }
        }
    }

    String::new()
}

// Text of a <title> element's first child, trimmed
//
// Only a text node counts; anything else (or no child at all) gives "".
fn title_text(title: ElementRef<'_>) -> String {
    title
        .first_child()
        .and_then(|child| child.value().as_text())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why does <title> only ever have one text child?
//    - HTML treats the inside of <title> as plain text (RCDATA)
//    - "<title><b>x</b></title>" gives the literal text "<b>x</b>"
//    - So "first child" and "all the text" are the same thing in practice
//
// 2. What is ElementRef::wrap?
//    - children() yields every kind of node (text, comments, elements)
//    - wrap() returns Some only for elements, None for everything else
// -----------------------------------------------------------------------------
