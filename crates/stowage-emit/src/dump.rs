use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use stowage_core::{AstContext, NodeId};

/// Nested JSON rendering of the subtree at `root`: each child identity is replaced by the child's
/// own document, and types are shown in source notation.
pub fn dump_tree(ctx: &AstContext, root: NodeId) -> Result<Value> {
    let node = ctx.try_node(root)?;
    let Value::Object(fields) = serde_json::to_value(node)? else {
        return Err(anyhow!("node {} did not serialize to an object", root));
    };
    let children = node.kind.children();

    let mut out = Map::new();
    out.insert("ast_type".to_string(), Value::String(format!("{:?}", node.tag())));
    out.insert("node_id".to_string(), Value::from(root.0));
    out.insert(
        "type".to_string(),
        node.ty
            .as_ref()
            .map(|t| Value::String(t.to_string()))
            .unwrap_or(Value::Null),
    );
    for (key, value) in fields {
        if matches!(key.as_str(), "ast_type" | "node_id" | "parent" | "type") {
            continue;
        }
        out.insert(key, nest(ctx, value, &children)?);
    }
    Ok(Value::Object(out))
}

pub fn dump_tree_string(ctx: &AstContext, root: NodeId) -> Result<String> {
    Ok(serde_json::to_string_pretty(&dump_tree(ctx, root)?)?)
}

fn nest(ctx: &AstContext, value: Value, children: &[NodeId]) -> Result<Value> {
    match value {
        Value::Number(n) => match n.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(id) if children.contains(&NodeId(id)) => dump_tree(ctx, NodeId(id)),
            _ => Ok(Value::Number(n)),
        },
        Value::Array(items) => Ok(Value::Array(
            items
                .into_iter()
                .map(|item| nest(ctx, item, children))
                .collect::<Result<_>>()?,
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stowage_core::builder::TreeBuilder;
    use stowage_core::Type;

    #[test]
    fn test_children_are_nested() {
        let mut ctx = AstContext::new();
        let mut b = TreeBuilder::new(&mut ctx);
        let key = b.name("owner", Some(Type::Address));
        let access = b
            .storage_index("balances", &Type::mapping(Type::Address, Type::Uint(256)), vec![key])
            .unwrap();
        let stmt = b.expr_stmt(access).unwrap();
        let module = b.module(vec![stmt]).unwrap();

        let dump = dump_tree(&ctx, module).unwrap();

        assert_eq!(dump["ast_type"], json!("Module"));
        assert_eq!(dump["type"], Value::Null);
        let subscript = &dump["body"][0]["value"];
        assert_eq!(subscript["ast_type"], json!("Subscript"));
        assert_eq!(subscript["type"], json!("uint256"));
        assert_eq!(subscript["slice"]["id"], json!("owner"));
        assert_eq!(subscript["value"]["attr"], json!("balances"));
        assert_eq!(subscript["value"]["type"], json!("HashMap[address, uint256]"));
        assert_eq!(subscript["value"]["value"]["id"], json!("self"));
        assert!(subscript.get("parent").is_none());
    }

    #[test]
    fn test_literal_values_are_not_mistaken_for_children() {
        let mut ctx = AstContext::new();
        let mut b = TreeBuilder::new(&mut ctx);
        let flag = b.bool_lit(true);
        let stmt = b.assert_stmt(flag).unwrap();
        let module = b.module(vec![stmt]).unwrap();

        let dump = dump_tree(&ctx, module).unwrap();
        assert_eq!(dump["body"][0]["test"]["value"], json!(true));
        assert_eq!(dump["body"][0]["node_id"], json!(stmt.0));
    }
}
