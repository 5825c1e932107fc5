//! Documentation content for linq-rewrite CLI

use crate::ast::Operator;

/// Get the docs overview (tree encoding and passes)
pub fn get_encoding_overview() -> &'static str {
    r#"LINQ-REWRITE

Rewrites query and index-definition expression trees into the canonical form
of the map/reduce indexing language. Trees are read as JSON from --input or
stdin.

PASSES

  roots             Root identifiers the tree reads from (--free skips lambda-bound ones)
  select-many       SELECT_MANY -> SELECT_MANY_TRANSLATED(source, outer, selector)
  expand-any        comparisons on any-paths -> ANY(collection, predicate)
  render            template text of the tree

TREE ENCODING

  {"constant": "bob"}                              literal; numbers with a fraction are exact decimals
  {"path": "x"}                                    root variable
  {"path": "Name", "parent": {"path": "x"}}        property x.Name
  {"path": "any", "kind": "any", "parent": P}      "any element of" P
  {"op": "EQ", "args": [A, B]}                     operation (see 'linq-rewrite operators')
  {"new": [["X", A], ["C", B]]}                    anonymous object new { X = A, C = B }
  {"param": "minTotal"}                            query parameter
  {"subquery": T}                                  nested query, never rewritten
  {"template": "{0}.Length", "args": [A]}          raw template, never parsed

  Every node accepts an optional "type": boolean, string, number, collection,
  anonymous, expression, or a domain class name. A class whose name is one
  of those reserved words is written "class:<name>", e.g. "class:string".

EXAMPLE

  echo '{"op": "EQ", "args": [
          {"path": "any", "kind": "any", "parent": {"path": "Tags", "parent": {"path": "x"}}},
          {"constant": "urgent"}]}' | linq-rewrite expand-any
"#
}

/// Get the operator registry with render templates
pub fn get_operator_reference() -> String {
    let mut out = String::from("OPERATORS\n\n");
    for op in Operator::ALL {
        out.push_str(&format!("  {:<24}{}\n", op.id(), op.template()));
    }
    out
}
