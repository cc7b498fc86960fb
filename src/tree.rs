//! Stateless search and extraction utilities over a `UiNode` tree.
//!
//! Everything here is read-only and stale-tolerant: a stale branch is treated
//! as absent rather than an error, so callers never have to unwind a whole
//! search because the host app re-rendered one subtree.

use crate::node::UiNode;

/// Depth cap for the debug dump, to keep output bounded.
const DUMP_MAX_DEPTH: usize = 12;

/// Find the first node (any depth, pre-order) whose resource id equals `id`.
pub fn find_by_resource_id<'a>(root: &'a UiNode, id: &str) -> Option<&'a UiNode> {
    if root.resource_id().ok().flatten() == Some(id) {
        return Some(root);
    }
    for child in root.children().ok()? {
        if let Some(found) = find_by_resource_id(child, id) {
            return Some(found);
        }
    }
    None
}

/// Collect all nodes whose text or accessibility label contains `needle`.
pub fn find_by_text<'a>(root: &'a UiNode, needle: &str) -> Vec<&'a UiNode> {
    let mut results = Vec::new();
    find_by_text_recursive(root, needle, &mut results);
    results
}

fn find_by_text_recursive<'a>(node: &'a UiNode, needle: &str, results: &mut Vec<&'a UiNode>) {
    let text_hit = node
        .text()
        .ok()
        .flatten()
        .map(|t| t.contains(needle))
        .unwrap_or(false);
    let desc_hit = node
        .content_desc()
        .ok()
        .flatten()
        .map(|d| d.contains(needle))
        .unwrap_or(false);
    if text_hit || desc_hit {
        results.push(node);
    }

    if let Ok(children) = node.children() {
        for child in children {
            find_by_text_recursive(child, needle, results);
        }
    }
}

/// Aggregate every text and label in the subtree into one string.
///
/// Pre-order, text before label per node, space-separated, empty values
/// skipped, result trimmed. Used to flatten multi-span message bubbles.
pub fn extract_all_text(node: &UiNode) -> String {
    let mut parts: Vec<String> = Vec::new();
    collect_text_recursive(node, &mut parts);
    parts.join(" ").trim().to_string()
}

fn collect_text_recursive(node: &UiNode, parts: &mut Vec<String>) {
    if let Ok(Some(text)) = node.text() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }
    if let Ok(Some(desc)) = node.content_desc() {
        let trimmed = desc.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }
    if let Ok(children) = node.children() {
        for child in children {
            collect_text_recursive(child, parts);
        }
    }
}

/// Baseline outgoing-message heuristic: the node's horizontal midpoint lies
/// in the right half of the screen. A stale node reads as not-right-aligned.
pub fn is_right_aligned(node: &UiNode, screen_width: i32) -> bool {
    match node.bounds() {
        Ok(bounds) => bounds.center_x() > screen_width / 2,
        Err(_) => false,
    }
}

/// Log the tree structure for debugging.
///
/// Compiled to a no-op in release builds: conversation content must never
/// reach logs outside a debug build, so the guard runs before any work.
pub fn dump_tree(node: &UiNode, depth: usize) {
    if !cfg!(debug_assertions) {
        return;
    }
    if depth > DUMP_MAX_DEPTH {
        return;
    }

    let indent = "  ".repeat(depth);
    let class = node.class_name().ok().flatten().unwrap_or("?");
    let id = node.resource_id().ok().flatten().unwrap_or("-");
    let text = node.text().ok().flatten().unwrap_or("");
    tracing::debug!("{}{} [{}] {:?}", indent, class, id, text);

    if let Ok(children) = node.children() {
        for child in children {
            dump_tree(child, depth + 1);
        }
    }
}
