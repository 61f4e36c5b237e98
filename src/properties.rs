//! Object assembly: flattens a parsed property list into an [`ObjectShape`].
use indexmap::IndexMap;

use crate::diagnostics::{Category, Reporter};
use crate::ir::{ObjectShape, PropertyRule, TypeNode};

/// Later occurrences of a name win but keep the first position, and are
/// reported. `required` lists the names whose winning occurrence is not
/// optional. The last `*` rule wins; repeating it counts as a repeated
/// property named `*`.
pub fn assemble(rules: Vec<PropertyRule>, reporter: &mut Reporter<'_>) -> ObjectShape {
    let mut fields: IndexMap<String, (TypeNode, bool)> = IndexMap::new();
    let mut additional: Option<Box<TypeNode>> = None;
    collect(rules, reporter, &mut fields, &mut additional);

    let required = fields
        .iter()
        .filter(|(_, (_, optional))| !optional)
        .map(|(name, _)| name.clone())
        .collect();
    let properties = fields.into_iter().map(|(name, (ty, _))| (name, ty)).collect();
    ObjectShape { properties, required, additional }
}

fn collect(
    rules: Vec<PropertyRule>,
    reporter: &mut Reporter<'_>,
    fields: &mut IndexMap<String, (TypeNode, bool)>,
    additional: &mut Option<Box<TypeNode>>,
) {
    for rule in rules {
        match rule {
            PropertyRule::Named { name, optional, ty, at } => {
                if fields.contains_key(&name) {
                    reporter.record(&at, Category::Semantic, format!("repeated property name:{name}"));
                }
                // a missing type was already reported where it was parsed
                if let Some(ty) = ty {
                    fields.insert(name, (ty, optional));
                }
            }
            PropertyRule::Additional { ty, at } => {
                if additional.is_some() {
                    reporter.record(&at, Category::Semantic, "repeated property name:*");
                }
                if let Some(ty) = ty {
                    *additional = Some(Box::new(ty));
                }
            }
            PropertyRule::Group(inner) => collect(inner, reporter, fields, additional),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::ir::{Primitive, Ty};
    use pretty_assertions::assert_eq;

    fn shape_of(src: &str) -> (ObjectShape, Vec<String>) {
        let parsed = Parser::new(src).run();
        let messages = parsed.reporter.diagnostics().iter().map(|d| d.message.clone()).collect();
        match parsed.start.map(|n| n.ty) {
            Some(Ty::Object(Some(shape))) => (shape, messages),
            other => panic!("expected an object, got {other:?}"),
        }
    }

    #[test]
    fn groups_flatten_into_the_object() {
        let (shape, errors) = shape_of("start = { id: integer (name: string, nick?: string) age?: number }");
        assert!(errors.is_empty());
        assert_eq!(shape.properties.keys().collect::<Vec<_>>(), vec!["id", "name", "nick", "age"]);
        assert_eq!(shape.required, vec!["id", "name"]);
        assert_eq!(shape.additional, None);
    }

    #[test]
    fn duplicate_inside_group_is_reported() {
        let (shape, errors) = shape_of("start = { a: string, (b: null, a?: integer) }");
        assert_eq!(errors, vec!["repeated property name:a"]);
        assert_eq!(shape.properties.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(shape.properties["a"], TypeNode::new(Ty::Primitive(Primitive::Integer)));
        assert_eq!(shape.required, vec!["b"]);
    }

    #[test]
    fn last_star_rule_wins() {
        let (shape, errors) = shape_of("start = { *: string, *: integer }");
        assert_eq!(errors, vec!["repeated property name:*"]);
        assert!(shape.properties.is_empty());
        assert!(shape.required.is_empty());
        assert_eq!(shape.additional, Some(Box::new(TypeNode::new(Ty::Primitive(Primitive::Integer)))));
    }
}
