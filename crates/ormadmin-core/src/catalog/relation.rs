//! Foreign-key edges between models.

/// A directed edge from a foreign-key field on `from_model` to `to_model`.
///
/// Edges are derived from field definitions; they are never stored on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyEdge<'a> {
    /// Model holding the foreign key.
    pub from_model: &'a str,
    /// Foreign-key field on `from_model`.
    pub from_field: &'a str,
    /// Referenced model.
    pub to_model: &'a str,
    /// Whether the reference may be null.
    pub nullable: bool,
}

impl<'a> ForeignKeyEdge<'a> {
    /// Check if deleting a `to_model` row forces deletion of referencing rows.
    ///
    /// Nullable references can be cleared instead, so they never cascade.
    pub fn is_cascading(&self) -> bool {
        !self.nullable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_edge_does_not_cascade() {
        let edge = ForeignKeyEdge {
            from_model: "Post",
            from_field: "editor",
            to_model: "User",
            nullable: true,
        };
        assert!(!edge.is_cascading());

        let edge = ForeignKeyEdge {
            nullable: false,
            ..edge
        };
        assert!(edge.is_cascading());
    }
}
