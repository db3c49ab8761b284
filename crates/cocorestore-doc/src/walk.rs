//! Pre-order traversal over untrusted structural documents.
//!
//! Compiled documents are arbitrary nestings of arrays and objects. The
//! walkers here visit every container node (scalars are leaves and are never
//! visited) so that pattern recognizers can probe each one independently.

use serde_json::Value;

/// Visit every array and object node of `node` in pre-order.
pub fn walk<F>(node: &Value, visitor: &mut F)
where
    F: FnMut(&Value),
{
    match node {
        Value::Array(items) => {
            visitor(node);
            for item in items {
                walk(item, visitor);
            }
        }
        Value::Object(map) => {
            visitor(node);
            for value in map.values() {
                walk(value, visitor);
            }
        }
        _ => {}
    }
}

/// Pre-order traversal that threads a context value down the recursion.
///
/// The visitor receives the context established by the nearest enclosing
/// container and returns the context its children should see. This replaces
/// shared mutable "current clip" state with an explicit parameter: a visitor
/// that opens a new scope at a node returns the new context, and only that
/// node's subtree observes it.
pub fn walk_with_context<C, F>(node: &Value, ctx: &C, visitor: &mut F)
where
    C: Clone,
    F: FnMut(&Value, &C) -> C,
{
    match node {
        Value::Array(items) => {
            let child_ctx = visitor(node, ctx);
            for item in items {
                walk_with_context(item, &child_ctx, visitor);
            }
        }
        Value::Object(map) => {
            let child_ctx = visitor(node, ctx);
            for value in map.values() {
                walk_with_context(value, &child_ctx, visitor);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn visits_every_container_in_preorder() {
        let doc = json!([{"a": [1, 2]}, [3], "s"]);
        let mut seen = Vec::new();
        walk(&doc, &mut |node| {
            seen.push(match node {
                Value::Array(items) => format!("arr{}", items.len()),
                Value::Object(map) => format!("obj{}", map.len()),
                _ => unreachable!("scalars are not visited"),
            });
        });
        assert_eq!(seen, vec!["arr3", "obj1", "arr2", "arr1"]);
    }

    #[test]
    fn scalars_are_not_visited() {
        let mut count = 0;
        walk(&json!(42), &mut |_| count += 1);
        walk(&json!("leaf"), &mut |_| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn context_is_scoped_to_subtrees() {
        // The inner array opens a new context; its sibling must still see the
        // root context.
        let doc = json!([["open", [1]], [2]]);
        let mut observed = Vec::new();
        walk_with_context(&doc, &0u32, &mut |node, ctx| {
            observed.push(*ctx);
            let opens = matches!(node, Value::Array(items)
                if items.first().map(|v| v == "open").unwrap_or(false));
            if opens {
                ctx + 1
            } else {
                *ctx
            }
        });
        // root sees 0, the "open" array sees 0, its child sees 1, the
        // sibling array sees 0 again.
        assert_eq!(observed, vec![0, 0, 1, 0]);
    }
}
