// src/template_processor.rs
use std::collections::HashMap;

const LAYOUT: &str = include_str!("../templates/layout.html");

pub struct TemplateProcessor;

impl TemplateProcessor {
    /// Replace `{{key}}` placeholders in one pass. Substituted values are never
    /// scanned again, unknown keys are left as written.
    pub fn process_variables(content: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key.trim()) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Wrap already-escaped page content in the site layout.
    pub fn render_page(page_title: &str, content: &str) -> String {
        let mut variables = HashMap::new();
        variables.insert(
            "page_title".to_string(),
            crate::utils::escape_html(page_title),
        );
        variables.insert("content".to_string(), content.to_string());
        Self::process_variables(LAYOUT, &variables)
    }
}
