use serde_json::{json, Value};
use std::sync::Arc;
use tantivy_query_grammar::{Occur, UserInputAst, UserInputBound, UserInputLeaf};

use semsearch_core::error::{Error, Result};
use semsearch_core::types::DEFAULT_FIELD;

use crate::context::QueryContext;
use crate::fields::{DefaultOperator, QueryFieldConfig};
use crate::lexical;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Term,
    Phrase,
}

/// A single-field literal about to be compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryNode<'a> {
    pub field: &'a str,
    pub texts: Vec<&'a str>,
    pub kind: LiteralKind,
    pub slop: u32,
    pub boost: f32,
}

impl QueryNode<'_> {
    /// The node's terms joined by single spaces.
    pub fn text(&self) -> String {
        self.texts.join(" ")
    }
}

/// Outcome of asking an interceptor about a literal node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeDecision {
    Replace(Value),
    Defer,
}

/// Hook consulted for every term and phrase node before lexical compilation.
pub trait NodeInterceptor: Send + Sync {
    fn intercept(&self, node: &QueryNode<'_>, context: &mut QueryContext) -> NodeDecision;
}

/// Turns a parsed query tree into the engine's JSON query DSL.
pub struct QueryCompiler {
    fields: QueryFieldConfig,
    interceptors: Vec<Arc<dyn NodeInterceptor>>,
}

impl QueryCompiler {
    pub fn new(fields: QueryFieldConfig) -> Self {
        Self { fields, interceptors: Vec::new() }
    }

    pub fn add_interceptor(&mut self, interceptor: Arc<dyn NodeInterceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn fields(&self) -> &QueryFieldConfig {
        &self.fields
    }

    pub fn compile(&self, ast: &UserInputAst, context: &mut QueryContext) -> Result<Value> {
        self.compile_ast(ast, 1.0, context)
    }

    fn compile_ast(&self, ast: &UserInputAst, boost: f32, context: &mut QueryContext) -> Result<Value> {
        match ast {
            UserInputAst::Leaf(leaf) => self.compile_leaf(leaf, boost, context),
            UserInputAst::Boost(inner, factor) => {
                // the factor's numeric type differs across grammar versions; all of them print as a float
                let factor = factor.to_string().parse::<f32>().unwrap_or(1.0);
                self.compile_ast(inner, boost * factor, context)
            }
            UserInputAst::Clause(clauses) => self.compile_clause(clauses, boost, context),
            #[allow(unreachable_patterns)]
            other => Err(Error::InvalidQuery(format!("unsupported query syntax: {other:?}"))),
        }
    }

    fn compile_clause(&self, clauses: &[(Option<Occur>, UserInputAst)], boost: f32, context: &mut QueryContext) -> Result<Value> {
        match clauses {
            [] => return Ok(json!({ "match_all": {} })),
            [(occur, only)] if *occur != Some(Occur::MustNot) => return self.compile_ast(only, boost, context),
            _ => {}
        }
        let mut must = Vec::new();
        let mut should = Vec::new();
        let mut must_not = Vec::new();
        for (occur, child) in clauses {
            let compiled = self.compile_ast(child, 1.0, context)?;
            match occur {
                Some(Occur::Must) => must.push(compiled),
                Some(Occur::Should) => should.push(compiled),
                Some(Occur::MustNot) => must_not.push(compiled),
                None => match self.fields.default_operator {
                    DefaultOperator::And => must.push(compiled),
                    DefaultOperator::Or => should.push(compiled),
                },
            }
        }
        let mut body = json!({});
        if !must.is_empty() {
            body["must"] = Value::Array(must);
        }
        if !should.is_empty() {
            body["should"] = Value::Array(should);
        }
        if !must_not.is_empty() {
            body["must_not"] = Value::Array(must_not);
        }
        if boost != 1.0 {
            body["boost"] = json!(boost);
        }
        Ok(json!({ "bool": body }))
    }

    fn compile_leaf(&self, leaf: &UserInputLeaf, boost: f32, context: &mut QueryContext) -> Result<Value> {
        match leaf {
            UserInputLeaf::Literal(lit) => {
                let field = lit.field_name.as_deref().unwrap_or(DEFAULT_FIELD);
                let texts: Vec<&str> = lit.phrase.split_whitespace().collect();
                if texts.is_empty() {
                    return Ok(json!({ "match_all": {} }));
                }
                let kind = if texts.len() > 1 { LiteralKind::Phrase } else { LiteralKind::Term };
                let node = QueryNode { field, texts, kind, slop: lit.slop, boost };
                if lit.prefix {
                    return Ok(lexical::prefix_query(&self.fields, &node));
                }
                Ok(self.compile_node(&node, context))
            }
            UserInputLeaf::All => Ok(json!({ "match_all": {} })),
            UserInputLeaf::Range { field, lower, upper, .. } => {
                let field = field
                    .as_deref()
                    .ok_or_else(|| Error::InvalidQuery("range query without a field".to_string()))?;
                let mut bounds = json!({});
                match lower {
                    UserInputBound::Inclusive(v) => bounds["gte"] = json!(v),
                    UserInputBound::Exclusive(v) => bounds["gt"] = json!(v),
                    UserInputBound::Unbounded => {}
                }
                match upper {
                    UserInputBound::Inclusive(v) => bounds["lte"] = json!(v),
                    UserInputBound::Exclusive(v) => bounds["lt"] = json!(v),
                    UserInputBound::Unbounded => {}
                }
                Ok(json!({ "range": { field: bounds } }))
            }
            UserInputLeaf::Set { field, elements, .. } => {
                let field = field.as_deref().unwrap_or(DEFAULT_FIELD);
                Ok(json!({ "terms": { field: elements } }))
            }
            #[allow(unreachable_patterns)]
            other => Err(Error::InvalidQuery(format!("unsupported query syntax: {other:?}"))),
        }
    }

    /// Ask each interceptor in turn, falling back to the lexical builders.
    fn compile_node(&self, node: &QueryNode<'_>, context: &mut QueryContext) -> Value {
        for interceptor in &self.interceptors {
            if let NodeDecision::Replace(clause) = interceptor.intercept(node, context) {
                return clause;
            }
        }
        let text = node.text();
        context.add_field_log(node.field, &text);
        context.add_highlighted_query(&text);
        match node.kind {
            LiteralKind::Term => lexical::term_query(&self.fields, node),
            LiteralKind::Phrase => lexical::phrase_query(&self.fields, node),
        }
    }
}
