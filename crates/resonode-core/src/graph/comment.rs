//! Free-standing annotations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Comment identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    /// Wraps an id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Comment presentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    /// Note attached to a single node.
    #[default]
    Inline,
    /// Frame grouping several nodes.
    Frame,
}

/// Annotation text linked to zero or more nodes. Never evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    /// Comment id.
    pub id: CommentId,
    /// Body text.
    pub text: String,
    /// Presentation.
    pub kind: CommentKind,
    /// Linked nodes.
    pub links: Vec<NodeId>,
}
