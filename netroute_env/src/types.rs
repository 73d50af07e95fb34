//! Common types for the NetRoute environment abstraction.

use serde::{Deserialize, Serialize};

/// Stable identifier of a node within a graph.
///
/// Ids are short human-readable strings ("A", "B", ...) and must be unique
/// within one graph. They carry no meaning beyond identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Creates a NodeId from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<char> for NodeId {
    fn from(id: char) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_conversions() {
        assert_eq!(NodeId::from("A"), NodeId::new("A"));
        assert_eq!(NodeId::from('B').as_str(), "B");
        assert_eq!(NodeId::from("C").to_string(), "C");
    }
}
