//! The abstract UI node tree the parsers walk.
//!
//! `UiNode` is an owned snapshot of one on-screen element, mirroring the
//! attribute surface of a platform accessibility node: text, accessibility
//! label, resource id, class name, bounds, scrollability, editability, and
//! children. The host app can re-render while we walk, so nodes carry a
//! `stale` flag and every attribute accessor returns `Result`; traversal code
//! is expected to catch `NodeError::Stale` per branch and keep going.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by node attribute access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeError {
    /// The underlying element was invalidated by a concurrent re-render.
    #[error("stale node reference")]
    Stale,
}

/// On-screen bounding box, in screen pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl NodeBounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Horizontal midpoint of the box.
    pub fn center_x(&self) -> i32 {
        (self.left + self.right) / 2
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }
}

/// One node of the accessibility tree snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiNode {
    #[serde(default)]
    pub text: Option<String>,
    /// Accessibility label (contentDescription on the source platform).
    #[serde(default)]
    pub content_desc: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub bounds: NodeBounds,
    #[serde(default)]
    pub scrollable: bool,
    #[serde(default)]
    pub editable: bool,
    /// Set when the element was invalidated mid-walk.
    #[serde(default)]
    pub stale: bool,
    #[serde(default)]
    pub children: Vec<UiNode>,
}

impl UiNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible text, if any. Fails on a stale node.
    pub fn text(&self) -> Result<Option<&str>, NodeError> {
        self.check_live()?;
        Ok(self.text.as_deref())
    }

    /// Accessibility label, if any. Fails on a stale node.
    pub fn content_desc(&self) -> Result<Option<&str>, NodeError> {
        self.check_live()?;
        Ok(self.content_desc.as_deref())
    }

    pub fn resource_id(&self) -> Result<Option<&str>, NodeError> {
        self.check_live()?;
        Ok(self.resource_id.as_deref())
    }

    pub fn class_name(&self) -> Result<Option<&str>, NodeError> {
        self.check_live()?;
        Ok(self.class_name.as_deref())
    }

    pub fn bounds(&self) -> Result<NodeBounds, NodeError> {
        self.check_live()?;
        Ok(self.bounds)
    }

    pub fn is_scrollable(&self) -> Result<bool, NodeError> {
        self.check_live()?;
        Ok(self.scrollable)
    }

    pub fn is_editable(&self) -> Result<bool, NodeError> {
        self.check_live()?;
        Ok(self.editable)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Children of this node. Fails on a stale node; individual children may
    /// themselves be stale and fail on their own accessors.
    pub fn children(&self) -> Result<&[UiNode], NodeError> {
        self.check_live()?;
        Ok(&self.children)
    }

    fn check_live(&self) -> Result<(), NodeError> {
        if self.stale {
            Err(NodeError::Stale)
        } else {
            Ok(())
        }
    }

    // Builder helpers, used heavily by fixtures and tests.

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_content_desc(mut self, desc: impl Into<String>) -> Self {
        self.content_desc = Some(desc.into());
        self
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class_name = Some(class.into());
        self
    }

    pub fn with_bounds(mut self, bounds: NodeBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn scrollable(mut self) -> Self {
        self.scrollable = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }

    pub fn with_child(mut self, child: UiNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<UiNode>) -> Self {
        self.children.extend(children);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_node_accessors() {
        let node = UiNode::new()
            .with_text("hello")
            .with_resource_id("com.whatsapp:id/message_text")
            .with_class("android.widget.TextView");

        assert_eq!(node.text().unwrap(), Some("hello"));
        assert_eq!(
            node.resource_id().unwrap(),
            Some("com.whatsapp:id/message_text")
        );
        assert!(!node.is_scrollable().unwrap());
    }

    #[test]
    fn test_stale_node_fails_access() {
        let node = UiNode::new().with_text("gone").stale();
        assert_eq!(node.text(), Err(NodeError::Stale));
        assert_eq!(node.children().err(), Some(NodeError::Stale));
    }

    #[test]
    fn test_bounds_center() {
        let bounds = NodeBounds::new(100, 0, 300, 50);
        assert_eq!(bounds.center_x(), 200);
        assert_eq!(bounds.width(), 200);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let tree = UiNode::new()
            .with_class("android.widget.FrameLayout")
            .with_child(UiNode::new().with_text("hi").with_bounds(NodeBounds::new(0, 0, 10, 10)));

        let json = serde_json::to_string(&tree).unwrap();
        let back: UiNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back.child_count(), 1);
        assert_eq!(back.children[0].text, Some("hi".to_string()));
    }
}
