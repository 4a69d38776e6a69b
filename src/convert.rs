use crate::error::JsoncError;
use crate::model::{Node, NodeKind, Position};
use crate::tokenizer::canonical_number;

const RECURSION_LIMIT: usize = 256;

/// Builds a layout tree from an already-parsed `serde_json::Value`, so
/// values produced in-process go through the same engine as parsed text.
pub fn value_to_node(value: &serde_json::Value) -> Result<Node, JsoncError> {
    convert(value, RECURSION_LIMIT)
}

fn convert(value: &serde_json::Value, depth_left: usize) -> Result<Node, JsoncError> {
    if depth_left == 0 {
        return Err(JsoncError::new(
            "value nesting too deep - possible circular reference",
            Position::default(),
        ));
    }

    let mut node = Node::default();
    match value {
        serde_json::Value::Null => {
            node.kind = NodeKind::Null;
            node.text = "null".to_string();
        }
        serde_json::Value::Bool(b) => {
            node.kind = if *b { NodeKind::True } else { NodeKind::False };
            node.text = if *b { "true" } else { "false" }.to_string();
        }
        serde_json::Value::Number(n) => {
            node.kind = NodeKind::Number;
            node.text = canonical_number(&n.to_string());
        }
        serde_json::Value::String(s) => {
            node.kind = NodeKind::String;
            node.text = quote(s);
        }
        serde_json::Value::Array(elems) => {
            node.kind = NodeKind::Array;
            node.children.reserve(elems.len());
            for elem in elems {
                node.children.push(convert(elem, depth_left - 1)?);
            }
        }
        serde_json::Value::Object(map) => {
            node.kind = NodeKind::Object;
            for (key, member) in map {
                let mut child = convert(member, depth_left - 1)?;
                child.key = Some(quote(key));
                node.children.push(child);
            }
        }
    }
    Ok(node)
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("{:?}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_nested_values() {
        let node = value_to_node(&json!({"a": [1, "x"], "b": null})).unwrap();
        assert_eq!(node.kind, NodeKind::Object);
        assert_eq!(node.children[0].key.as_deref(), Some("\"a\""));
        assert_eq!(node.children[0].children[1].text, "\"x\"");
        assert_eq!(node.children[1].text, "null");
    }

    #[test]
    fn numbers_are_canonicalized() {
        let node = value_to_node(&json!([1e21])).unwrap();
        assert_eq!(node.children[0].text, "1e21");
    }
}
