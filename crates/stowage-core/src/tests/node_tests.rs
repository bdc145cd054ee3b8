use crate::node::{BinOpKind, Node, NodeId, NodeKind, NodeTag};
use crate::types::{Mutability, Visibility};
use num_bigint::BigInt;
use pretty_assertions::assert_eq;

fn ids(raw: &[u32]) -> Vec<NodeId> {
    raw.iter().map(|n| NodeId(*n)).collect()
}

#[test]
fn test_children_in_source_order() {
    let func = NodeKind::FunctionDef {
        name: "f".into(),
        args: ids(&[1, 2]),
        body: ids(&[3, 4]),
        visibility: Visibility::External,
        mutability: Mutability::View,
    };
    assert_eq!(func.children(), ids(&[1, 2, 3, 4]));

    let branch = NodeKind::If {
        test: NodeId(1),
        body: ids(&[2]),
        orelse: ids(&[3]),
    };
    assert_eq!(branch.children(), ids(&[1, 2, 3]));

    let write = NodeKind::StorageWrite {
        slot: NodeId(1),
        keys: ids(&[2, 3]),
        value: NodeId(4),
    };
    assert_eq!(write.children(), ids(&[1, 2, 3, 4]));
    assert_eq!(write.storage_operands(), Some(ids(&[2, 3, 4])));
}

#[test]
fn test_replace_child_keeps_role() {
    let mut kind = NodeKind::BinOp {
        left: NodeId(1),
        op: BinOpKind::Sub,
        right: NodeId(2),
    };
    assert!(kind.replace_child(NodeId(2), NodeId(9)));
    assert_eq!(
        kind,
        NodeKind::BinOp {
            left: NodeId(1),
            op: BinOpKind::Sub,
            right: NodeId(9),
        }
    );
    assert!(!kind.replace_child(NodeId(2), NodeId(10)));
}

#[test]
fn test_replace_optional_child() {
    let mut kind = NodeKind::Return {
        value: Some(NodeId(5)),
    };
    assert!(kind.replace_child(NodeId(5), NodeId(6)));
    assert_eq!(kind.children(), ids(&[6]));

    let mut empty = NodeKind::Return { value: None };
    assert!(!empty.replace_child(NodeId(5), NodeId(6)));
}

#[test]
fn test_statement_lists() {
    let branch = NodeKind::If {
        test: NodeId(1),
        body: ids(&[2]),
        orelse: ids(&[3]),
    };
    assert!(branch.holds_statement(NodeId(3)));
    assert!(!branch.holds_statement(NodeId(1)));
    assert!(NodeKind::Pass.statement_lists().is_empty());
    assert!(NodeTag::StorageRead.is_statement());
    assert!(!NodeTag::Subscript.is_statement());
}

#[test]
fn test_node_json_shape() {
    let mut node = Node::new(
        NodeId(7),
        NodeKind::Int {
            value: BigInt::from(10).pow(30),
        },
    );
    node.parent = Some(NodeId(3));

    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["ast_type"], "Int");
    assert_eq!(json["node_id"], 7);
    assert_eq!(json["parent"], 3);
    assert_eq!(json["value"], "1000000000000000000000000000000");

    let back: Node = serde_json::from_value(json).unwrap();
    assert_eq!(back, node);
}

#[test]
fn test_name_field_does_not_clash_with_identity() {
    let json = serde_json::json!({
        "node_id": 4,
        "ast_type": "Name",
        "id": "self"
    });
    let node: Node = serde_json::from_value(json).unwrap();
    assert_eq!(node.id, NodeId(4));
    assert!(node.is_name("self"));
    assert_eq!(node.parent, None);
}
