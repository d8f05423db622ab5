/// What a single query compilation produced besides the query itself.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QueryContext {
    field_logs: Vec<(String, String)>,
    highlighted_queries: Vec<String>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field_log(&mut self, field: &str, text: &str) {
        self.field_logs.push((field.to_string(), text.to_string()));
    }

    pub fn add_highlighted_query(&mut self, text: &str) {
        if !self.highlighted_queries.iter().any(|q| q == text) {
            self.highlighted_queries.push(text.to_string());
        }
    }

    pub fn field_logs(&self) -> &[(String, String)] {
        &self.field_logs
    }

    pub fn highlighted_queries(&self) -> &[String] {
        &self.highlighted_queries
    }
}
