use crate::{
    context::AstContext,
    node::{Node, NodeId, NodeTag},
};

impl AstContext {
    /// Nearest strict ancestor of `id` with the given kind that satisfies `predicate`.
    pub fn get_ancestor<F>(&self, id: NodeId, tag: NodeTag, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        let mut current = self.parent(id);
        while let Some(candidate) = current {
            let node = self.get(candidate)?;
            if node.tag() == tag && predicate(node) {
                return Some(candidate);
            }
            current = node.parent;
        }
        None
    }

    /// Every descendant of `id` with the given kind that satisfies `predicate`, in pre-order.
    pub fn get_descendants<F>(
        &self,
        id: NodeId,
        tag: NodeTag,
        predicate: F,
        include_self: bool,
    ) -> Vec<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        let mut found = Vec::new();
        let mut stack = if include_self {
            vec![id]
        } else {
            let mut children = self.children(id);
            children.reverse();
            children
        };

        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            if node.tag() == tag && predicate(node) {
                found.push(current);
            }
            let mut children = node.kind.children();
            children.reverse();
            stack.extend(children);
        }
        found
    }

    pub fn has_descendant<F>(&self, id: NodeId, tag: NodeTag, predicate: F) -> bool
    where
        F: Fn(&Node) -> bool,
    {
        !self.get_descendants(id, tag, predicate, true).is_empty()
    }
}
