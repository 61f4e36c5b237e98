use serde_json::{json, Map, Value};
use crate::ir::{ObjectShape, Ty, TypeNode};

pub const DEFINITIONS_POINTER: &str = "#/definitions/";

/// Render a node as a JSON Schema fragment. Facets are appended after the
/// structural keys, overriding any key of the same name.
pub fn lower_to_json(node: &TypeNode) -> Map<String, Value> {
    let mut out = lower_core(&node.ty);
    for (id, value) in &node.facets {
        out.insert(id.as_str().to_string(), value.to_json());
    }
    out
}

fn lower_core(ty: &Ty) -> Map<String, Value> {
    let value = match ty {
        Ty::Primitive(p) => json!({ "type": p.as_str() }),
        Ty::Reference(name) => json!({ "$ref": format!("{DEFINITIONS_POINTER}{name}") }),
        Ty::Pattern(rx) => json!({ "type": "string", "pattern": rx }),
        Ty::Object(None) => json!({ "type": "object" }),
        Ty::Object(Some(shape)) => return lower_object(shape),
        Ty::Array(None) => json!({ "type": "array" }),
        Ty::Array(Some(items)) => json!({ "type": "array", "items": lower_to_json(items) }),
        Ty::OneOf(arms) => {
            let arms: Vec<Value> = arms.iter().map(|a| Value::Object(lower_to_json(a))).collect();
            json!({ "oneOf": arms })
        }
        Ty::Merge(left, right) => {
            // key union, right side wins
            let mut out = lower_to_json(left);
            out.extend(lower_to_json(right));
            return out;
        }
    };
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn lower_object(shape: &ObjectShape) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("type".into(), Value::from("object"));
    out.insert(
        "required".into(),
        Value::Array(shape.required.iter().cloned().map(Value::from).collect()),
    );
    out.insert(
        "additionalProperties".into(),
        match &shape.additional {
            Some(ty) => Value::Object(lower_to_json(ty)),
            None => Value::Bool(false),
        },
    );
    if !shape.properties.is_empty() {
        let props: Map<String, Value> = shape
            .properties
            .iter()
            .map(|(name, ty)| (name.clone(), Value::Object(lower_to_json(ty))))
            .collect();
        out.insert("properties".into(), Value::Object(props));
    }
    out
}
