//! Compiles where trees into predicates.
//!
//! Sibling nodes are folded left to right. Each node is combined with the
//! result so far using the connector of the node before it, so
//! `[a (or), b (and), c]` compiles to `(a || b) && c`. Groups compile their
//! children the same way and act as parentheses.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::trace;

use crate::accessor::{accessor, PropertyAccessor, Target};
use crate::clause::ClauseNode;
use crate::comparison::{validate, validate_arity, validate_single, Comparison, Connector};
use crate::convert::{convert, convert_all};
use crate::error::{ClauseContext, QueryError, Result};
use crate::hooks::Hooks;
use crate::predicate::{like_to_regex, CompareOp, Filter, Predicate, TextOp};
use crate::property::{Queryable, ReadFn};
use crate::value::ClauseValue;

/// Compiles a sequence of sibling clause nodes into one predicate.
///
/// An empty sequence, at any level, compiles to a predicate that matches
/// nothing.
pub fn compile_where<T: Queryable>(nodes: &[ClauseNode], hooks: Hooks<'_, T>) -> Result<Predicate<T>> {
    // A preprocessor edits nodes in place, so each node is copied once here
    // and its children are handed down by value.
    match hooks.preprocessor {
        None => fold(nodes.iter().map(Cow::Borrowed), hooks),
        Some(_) => fold(nodes.iter().cloned().map(Cow::Owned), hooks),
    }
}

fn fold<'n, T, I>(nodes: I, hooks: Hooks<'_, T>) -> Result<Predicate<T>>
where
    T: Queryable,
    I: IntoIterator<Item = Cow<'n, ClauseNode>>,
{
    let mut result: Option<Predicate<T>> = None;
    let mut previous = Connector::default();

    for mut node in nodes {
        if let Some(preprocessor) = hooks.preprocessor {
            preprocessor
                .preprocess(node.to_mut())
                .map_err(QueryError::Hook)?;
        }
        let connector = node.connector;
        let next = compile_node(node, hooks)?;

        result = Some(match result {
            None => next,
            Some(acc) => match previous {
                Connector::And => acc.and(next),
                Connector::Or => acc.or(next),
            },
        });
        previous = connector;
    }

    Ok(result.unwrap_or_else(|| Predicate::constant(false)))
}

fn compile_node<T: Queryable>(node: Cow<'_, ClauseNode>, hooks: Hooks<'_, T>) -> Result<Predicate<T>> {
    if let Some(provider) = hooks.predicate {
        if let Some(custom) = provider.predicate(&node).map_err(QueryError::Hook)? {
            trace!(path = %node.path, "clause compiled by predicate provider");
            return Ok(custom);
        }
    }

    let negate = node.negate;
    let group = match node {
        Cow::Borrowed(node) => match &node.children {
            Some(children) => fold(children.iter().map(Cow::Borrowed), hooks)?,
            None => return compile_clause(&node.path, node.comparison, &node.values, negate),
        },
        Cow::Owned(node) => match node.children {
            Some(children) => fold(children.into_iter().map(Cow::Owned), hooks)?,
            None => return compile_clause(&node.path, node.comparison, &node.values, negate),
        },
    };
    Ok(if negate { group.not() } else { group })
}

/// Compiles a single comparison outside of a where tree.
///
/// Errors carry the path, comparison and negate flag of the clause.
pub fn compile_clause<T: Queryable>(
    path: &str,
    comparison: Comparison,
    values: &[Option<String>],
    negate: bool,
) -> Result<Predicate<T>> {
    trace!(path, %comparison, negate, values = values.len(), "compiling clause");
    let ctx = ClauseContext::new(path, comparison, negate);

    let predicate = accessor::<T>(path)
        .and_then(|accessor| build_leaf(&accessor, comparison, values))
        .map_err(|e| e.in_clause(&ctx))?;

    Ok(if negate { predicate.not() } else { predicate })
}

/// Restricts to items whose `key` property is one of `ids`.
pub fn id_predicate<T: Queryable>(key: &str, ids: &[String]) -> Result<Predicate<T>> {
    let values: Vec<Option<String>> = ids.iter().cloned().map(Some).collect();
    compile_clause(key, Comparison::In, &values, false)
}

/// Builds the un-negated predicate for one comparison against a resolved
/// accessor.
pub(crate) fn build_leaf<T: Queryable>(
    accessor: &PropertyAccessor<T>,
    comparison: Comparison,
    values: &[Option<String>],
) -> Result<Predicate<T>> {
    let (ty, nullable, read) = match accessor.target() {
        Target::Collection(matcher) => {
            if comparison == Comparison::Between {
                validate_arity(comparison, values.len())?;
            }
            return matcher.any_match(comparison, values);
        }
        Target::Value { ty, nullable, read } => (*ty, *nullable, read),
    };
    let path = accessor.path();
    validate(ty.family(), comparison)?;

    match comparison {
        Comparison::In | Comparison::NotIn => {
            let operands = convert_all(values, ty, nullable)?;
            let member = membership(path, operands, read);
            Ok(if comparison == Comparison::NotIn {
                member.not()
            } else {
                member
            })
        }
        Comparison::Between => {
            validate_arity(comparison, values.len())?;
            let operands = convert_all(values, ty, nullable)?;
            let [low, high] = <[ClauseValue; 2]>::try_from(operands)
                .map_err(|_| QueryError::validation("between requires a lower and an upper bound"))?;
            if low == high {
                Ok(compare(path, CompareOp::Eq, low, read))
            } else {
                Ok(compare(path, CompareOp::Gte, low, read).and(compare(
                    path,
                    CompareOp::Lte,
                    high,
                    read,
                )))
            }
        }
        _ => {
            validate_single(ty.family(), comparison)?;
            validate_arity(comparison, values.len())?;
            let token = values.first().and_then(|t| t.as_deref());

            if let Some(op) = text_op(comparison) {
                let needle = require_token(comparison, token)?;
                return Ok(text(path, op, needle.to_string(), read));
            }
            if comparison == Comparison::Like {
                let pattern = require_token(comparison, token)?;
                return like(path, pattern, read);
            }
            let op = compare_op(comparison).ok_or_else(|| {
                QueryError::validation(format!("{comparison} is not a single-value comparison"))
            })?;
            Ok(compare(path, op, convert(token, ty, nullable)?, read))
        }
    }
}

fn compare_op(comparison: Comparison) -> Option<CompareOp> {
    match comparison {
        Comparison::Equal => Some(CompareOp::Eq),
        Comparison::NotEqual => Some(CompareOp::Ne),
        Comparison::GreaterThan => Some(CompareOp::Gt),
        Comparison::GreaterThanOrEqual => Some(CompareOp::Gte),
        Comparison::LessThan => Some(CompareOp::Lt),
        Comparison::LessThanOrEqual => Some(CompareOp::Lte),
        _ => None,
    }
}

fn text_op(comparison: Comparison) -> Option<TextOp> {
    match comparison {
        Comparison::Contains => Some(TextOp::Contains),
        Comparison::StartsWith => Some(TextOp::StartsWith),
        Comparison::EndsWith => Some(TextOp::EndsWith),
        _ => None,
    }
}

fn require_token(comparison: Comparison, token: Option<&str>) -> Result<&str> {
    token.ok_or_else(|| QueryError::validation(format!("{comparison} requires a non-null value")))
}

fn compare<T: 'static>(path: &str, op: CompareOp, operand: ClauseValue, read: &ReadFn<T>) -> Predicate<T> {
    let read = Arc::clone(read);
    let filter = Filter::Compare {
        path: path.to_string(),
        op,
        value: operand.clone(),
    };
    Predicate::new(filter, move |item: &T| op.eval(&read(item), &operand))
}

fn membership<T: 'static>(path: &str, operands: Vec<ClauseValue>, read: &ReadFn<T>) -> Predicate<T> {
    let read = Arc::clone(read);
    let filter = Filter::In {
        path: path.to_string(),
        values: operands.clone(),
    };
    Predicate::new(filter, move |item: &T| {
        let value = read(item);
        operands.iter().any(|operand| operand.equals(&value))
    })
}

fn text<T: 'static>(path: &str, op: TextOp, needle: String, read: &ReadFn<T>) -> Predicate<T> {
    let read = Arc::clone(read);
    let filter = Filter::Text {
        path: path.to_string(),
        op,
        value: needle.clone(),
    };
    Predicate::new(filter, move |item: &T| {
        read(item).as_str().is_some_and(|s| op.eval(s, &needle))
    })
}

fn like<T: 'static>(path: &str, pattern: &str, read: &ReadFn<T>) -> Result<Predicate<T>> {
    let regex = like_to_regex(pattern)
        .map_err(|e| QueryError::validation(format!("invalid like pattern '{pattern}': {e}")))?;
    let read = Arc::clone(read);
    let filter = Filter::Like {
        path: path.to_string(),
        pattern: pattern.to_string(),
    };
    Ok(Predicate::new(filter, move |item: &T| {
        read(item).as_str().is_some_and(|s| regex.is_match(s))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::property::Property;
    use crate::value::Number;

    #[derive(Debug, Clone)]
    struct Line {
        sku: String,
        qty: u32,
    }

    impl Queryable for Line {
        const FIELDS: &'static [&'static str] = &["sku", "qty"];

        fn property(name: &str) -> Option<Property<Self>> {
            match name {
                "sku" => Some(Property::scalar(|l: &Line| &l.sku)),
                "qty" => Some(Property::scalar(|l: &Line| &l.qty)),
                _ => None,
            }
        }
    }

    #[derive(Debug, Clone)]
    struct Person {
        name: String,
        age: i32,
        nick: Option<String>,
        lines: Vec<Line>,
    }

    impl Queryable for Person {
        const FIELDS: &'static [&'static str] = &["name", "age", "nick", "lines"];

        fn property(name: &str) -> Option<Property<Self>> {
            match name {
                "name" => Some(Property::scalar(|p: &Person| &p.name)),
                "age" => Some(Property::scalar(|p: &Person| &p.age)),
                "nick" => Some(Property::scalar(|p: &Person| &p.nick)),
                "lines" => Some(Property::list(|p: &Person| p.lines.as_slice())),
                _ => None,
            }
        }
    }

    fn person(name: &str, age: i32) -> Person {
        Person {
            name: name.into(),
            age,
            nick: None,
            lines: Vec::new(),
        }
    }

    fn people() -> Vec<Person> {
        vec![
            person("Ann", 30),
            person("Bo", 25),
            Person {
                nick: Some("Cee".into()),
                lines: vec![Line {
                    sku: "A-1".into(),
                    qty: 3,
                }],
                ..person("Cy", 17)
            },
        ]
    }

    fn names(nodes: &[ClauseNode]) -> Vec<String> {
        let predicate = compile_where::<Person>(nodes, Hooks::new()).unwrap();
        people()
            .into_iter()
            .filter(|p| predicate.matches(p))
            .map(|p| p.name)
            .collect()
    }

    #[test]
    fn single_comparisons() {
        assert_eq!(
            names(&[ClauseNode::leaf("age", Comparison::GreaterThan, ["20"])]),
            ["Ann", "Bo"]
        );
        assert_eq!(
            names(&[ClauseNode::leaf("name", Comparison::StartsWith, ["A"])]),
            ["Ann"]
        );
        assert_eq!(
            names(&[ClauseNode::leaf("name", Comparison::Like, ["_o"])]),
            ["Bo"]
        );
    }

    #[test]
    fn connector_comes_from_previous_node() {
        let nodes = [
            ClauseNode::leaf("name", Comparison::Equal, ["Ann"]).or(),
            ClauseNode::leaf("name", Comparison::Equal, ["Cy"]),
            ClauseNode::leaf("age", Comparison::LessThan, ["20"]),
        ];
        assert_eq!(names(&nodes), ["Cy"]);
    }

    #[test]
    fn empty_where_matches_nothing() {
        assert!(names(&[]).is_empty());
        assert!(names(&[ClauseNode::group(vec![])]).is_empty());
    }

    #[test]
    fn negated_group_negates_whole_result() {
        let group = ClauseNode::group(vec![
            ClauseNode::leaf("age", Comparison::GreaterThan, ["20"]).or(),
            ClauseNode::leaf("name", Comparison::Equal, ["Zed"]),
        ])
        .negated();
        assert_eq!(names(&[group]), ["Cy"]);
    }

    #[test]
    fn between_is_inclusive_and_collapses() {
        assert_eq!(
            names(&[ClauseNode::leaf("age", Comparison::Between, ["25", "30"])]),
            ["Ann", "Bo"]
        );

        let predicate =
            compile_clause::<Person>("age", Comparison::Between, &[Some("30".into()), Some("30".into())], false)
                .unwrap();
        assert_eq!(
            predicate.filter(),
            &Filter::Compare {
                path: "age".into(),
                op: CompareOp::Eq,
                value: ClauseValue::Number(Number::I64(30)),
            }
        );
    }

    #[test]
    fn membership_sets() {
        assert_eq!(
            names(&[ClauseNode::leaf("age", Comparison::In, ["17", "30"])]),
            ["Ann", "Cy"]
        );
        assert_eq!(
            names(&[ClauseNode::leaf("name", Comparison::NotIn, ["Ann"])]),
            ["Bo", "Cy"]
        );
        let empty: [&str; 0] = [];
        assert!(names(&[ClauseNode::leaf("age", Comparison::In, empty)]).is_empty());
        assert_eq!(names(&[ClauseNode::leaf("age", Comparison::NotIn, empty)]).len(), 3);
    }

    #[test]
    fn null_operands() {
        let is_null = ClauseNode::leaf("nick", Comparison::Equal, [""; 0]).with_values(vec![None]);
        assert_eq!(names(&[is_null.clone()]), ["Ann", "Bo"]);
        assert_eq!(names(&[is_null.negated()]), ["Cy"]);

        let null_age = compile_clause::<Person>("age", Comparison::Equal, &[None], false).unwrap_err();
        assert!(matches!(null_age, QueryError::Conversion { token: None, .. }));

        let null_contains =
            compile_clause::<Person>("name", Comparison::Contains, &[None], false).unwrap_err();
        assert!(matches!(null_contains, QueryError::Validation { .. }));
    }

    #[test]
    fn text_ops_skip_null_values() {
        assert!(names(&[ClauseNode::leaf("nick", Comparison::Contains, ["e"])]) == ["Cy"]);
        assert!(names(&[ClauseNode::leaf("nick", Comparison::EndsWith, ["e"]).negated()]) == ["Ann", "Bo"]);
    }

    #[test]
    fn any_match_over_collections() {
        assert_eq!(
            names(&[ClauseNode::leaf("lines[qty]", Comparison::GreaterThanOrEqual, ["3"])]),
            ["Cy"]
        );
        assert_eq!(
            names(&[ClauseNode::leaf("lines[sku]", Comparison::NotIn, ["B-2"])]),
            ["Cy"]
        );

        let predicate =
            compile_clause::<Person>("lines[qty]", Comparison::Equal, &[Some("3".into())], false).unwrap();
        assert!(matches!(predicate.filter(), Filter::Any { path, .. } if path == "lines"));
    }

    #[test]
    fn validation_errors_carry_clause() {
        let err = compile_clause::<Person>("age", Comparison::Contains, &[Some("3".into())], true)
            .unwrap_err();
        let clause = err.clause().unwrap();
        assert_eq!(clause.path, "age");
        assert_eq!(clause.comparison, Comparison::Contains);
        assert!(clause.negate);

        let err = compile_clause::<Person>("name", Comparison::GreaterThan, &[Some("A".into())], false)
            .unwrap_err();
        assert!(matches!(err, QueryError::Validation { .. }));

        let err =
            compile_clause::<Person>("age", Comparison::Between, &[Some("1".into())], false).unwrap_err();
        assert!(err.to_string().contains("between requires exactly 2 values, but 1 were provided"));

        let err = compile_clause::<Person>("lines[qty]", Comparison::Between, &[Some("1".into())], false)
            .unwrap_err();
        assert!(matches!(err, QueryError::Validation { .. }));
        assert_eq!(err.clause().unwrap().path, "lines[qty]");

        let err = compile_clause::<Person>("age", Comparison::Equal, &[Some("old".into())], false)
            .unwrap_err();
        assert!(matches!(err, QueryError::Conversion { .. }));

        let err = compile_clause::<Person>("height", Comparison::Equal, &[Some("1".into())], false)
            .unwrap_err();
        assert!(matches!(err, QueryError::PathResolution { .. }));
    }

    #[test]
    fn predicate_provider_overrides_leaf() {
        let adults = |node: &ClauseNode| -> std::result::Result<Option<Predicate<Person>>, BoxError> {
            if node.path == "adult" {
                return Ok(Some(Predicate::custom("adult", |p: &Person| p.age >= 18)));
            }
            Ok(None)
        };
        let hooks = Hooks::<Person>::new().with_predicate_provider(&adults);

        let nodes = [ClauseNode::leaf("adult", Comparison::Equal, ["true"])];
        let predicate = compile_where::<Person>(&nodes, hooks).unwrap();
        let matched: Vec<_> = people().into_iter().filter(|p| predicate.matches(p)).collect();
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn preprocessor_runs_before_compilation() {
        let rename = |node: &mut ClauseNode| -> std::result::Result<(), BoxError> {
            if node.path == "years" {
                node.path = "age".into();
            }
            Ok(())
        };
        let hooks = Hooks::<Person>::new().with_preprocessor(&rename);

        let nodes = [ClauseNode::leaf("years", Comparison::LessThan, ["18"])];
        let predicate = compile_where(&nodes, hooks).unwrap();
        assert!(predicate.matches(&person("Kid", 9)));
        assert!(!predicate.matches(&person("Adult", 40)));
    }

    #[test]
    fn preprocessor_reaches_nested_groups() {
        let seen = std::cell::Cell::new(0);
        let rename = |node: &mut ClauseNode| -> std::result::Result<(), BoxError> {
            seen.set(seen.get() + 1);
            if node.path == "years" {
                node.path = "age".into();
            }
            Ok(())
        };
        let hooks = Hooks::<Person>::new().with_preprocessor(&rename);

        let inner = ClauseNode::group(vec![
            ClauseNode::leaf("years", Comparison::GreaterThan, ["20"]),
            ClauseNode::group(vec![ClauseNode::leaf("years", Comparison::LessThan, ["60"])]),
        ]);
        let nodes = [ClauseNode::group(vec![inner]).negated()];
        let predicate = compile_where(&nodes, hooks).unwrap();

        assert_eq!(seen.get(), 5);
        assert!(!predicate.matches(&person("Adult", 40)));
        assert!(predicate.matches(&person("Kid", 9)));
        assert_eq!(nodes[0].children.as_ref().unwrap()[0].children.as_ref().unwrap()[0].path, "years");
    }

    #[test]
    fn hook_errors_propagate_unwrapped() {
        let deny = |_: &mut ClauseNode| -> std::result::Result<(), BoxError> { Err("denied".into()) };
        let hooks = Hooks::<Person>::new().with_preprocessor(&deny);

        let nodes = [ClauseNode::leaf("age", Comparison::Equal, ["1"])];
        let err = compile_where(&nodes, hooks).unwrap_err();
        assert!(matches!(err, QueryError::Hook(_)));
        assert_eq!(err.to_string(), "denied");
    }

    #[test]
    fn id_predicate_uses_membership() {
        let predicate = id_predicate::<Person>("name", &["Bo".to_string()]).unwrap();
        assert!(matches!(predicate.filter(), Filter::In { .. }));
        assert!(predicate.matches(&person("Bo", 1)));
        assert!(!predicate.matches(&person("Ann", 1)));
    }
}
