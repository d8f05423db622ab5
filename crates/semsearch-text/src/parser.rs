use tantivy_query_grammar::{parse_query, UserInputAst};
use tracing::debug;

use semsearch_core::error::{Error, Result};

/// Rewrites raw query text before it is parsed.
pub trait QueryFilter: Send + Sync {
    fn filter(&self, query: &str) -> String;
}

impl<F> QueryFilter for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn filter(&self, query: &str) -> String {
        self(query)
    }
}

/// Query-string parser with an ordered chain of text filters.
#[derive(Default)]
pub struct QueryParser {
    filters: Vec<Box<dyn QueryFilter>>,
}

impl QueryParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: impl QueryFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    /// Run the filter chain in registration order.
    pub fn rewrite(&self, query: &str) -> String {
        self.filters
            .iter()
            .fold(query.to_string(), |q, f| f.filter(&q))
    }

    pub fn parse(&self, query: &str) -> Result<UserInputAst> {
        let rewritten = self.rewrite(query);
        if rewritten != query {
            debug!(query, rewritten = %rewritten, "query rewritten by filter chain");
        }
        parse_query(&rewritten).map_err(|_| Error::InvalidQuery(rewritten))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_run_in_order() {
        let mut parser = QueryParser::new();
        parser.add_filter(|q: &str| format!("{q} a"));
        parser.add_filter(|q: &str| q.replace(" a", " b"));
        assert_eq!(parser.rewrite("x"), "x b");
    }
}
