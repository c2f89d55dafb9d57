//! Error types for layout computation

/// Errors raised while laying out a tree
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// An edge references a node that is not in the graph
    #[error("edge '{edge}' references unknown node '{node}'")]
    UnknownNode {
        /// Offending edge id
        edge: String,
        /// Missing node id
        node: String,
    },

    /// The layout engine failed
    #[error("layout engine failed: {0}")]
    Engine(String),
}

impl LayoutError {
    /// Create engine error from any message
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }
}

/// Result type for layout operations
pub type LayoutResult<T> = Result<T, LayoutError>;
