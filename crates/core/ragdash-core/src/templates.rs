//! Template engine for server-rendered pages

use crate::{DashError, Result};
use handlebars::Handlebars;
use serde::Serialize;

/// Template engine wrapper
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        // Missing fields render empty
        handlebars.set_strict_mode(false);

        handlebars.register_helper("join", Box::new(join_helper));

        Self { handlebars }
    }

    /// Render an inline template
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        self.handlebars
            .render_template(template, data)
            .map_err(|e| DashError::template(e.to_string()))
    }

    /// Register a template
    pub fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| DashError::template(e.to_string()))?;
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// Render a registered template
    pub fn render_named<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        self.handlebars
            .render(name, data)
            .map_err(|e| DashError::template(e.to_string()))
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn join_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h
        .param(0)
        .ok_or_else(|| handlebars::RenderErrorReason::ParamNotFoundForIndex("join", 0))?;
    let separator = h
        .param(1)
        .and_then(|p| p.value().as_str())
        .unwrap_or(", ");

    let items: Vec<String> = param
        .value()
        .as_array()
        .map(|values| {
            values
                .iter()
                .map(|v| match v.as_str() {
                    Some(s) => s.to_string(),
                    None => v.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    out.write(&handlebars::html_escape(&items.join(separator)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_with_variables() {
        let engine = TemplateEngine::new();
        let result = engine
            .render("Hello, {{name}}!", &json!({"name": "admin"}))
            .unwrap();
        assert_eq!(result, "Hello, admin!");
    }

    #[test]
    fn test_values_are_html_escaped() {
        let engine = TemplateEngine::new();
        let result = engine
            .render("{{name}}", &json!({"name": "<b>x</b>.pdf"}))
            .unwrap();
        assert_eq!(result, "&lt;b&gt;x&lt;/b&gt;.pdf");
    }

    #[test]
    fn test_join_helper() {
        let engine = TemplateEngine::new();
        let data = json!({"tags": ["hr", "<policy>"]});
        assert_eq!(engine.render("{{join tags \" | \"}}", &data).unwrap(), "hr | &lt;policy&gt;");
        assert_eq!(engine.render("{{join tags}}", &data).unwrap(), "hr, &lt;policy&gt;");
    }

    #[test]
    fn test_only_join_helper_registered() {
        let engine = TemplateEngine::new();
        assert!(engine.render("{{uppercase kind}}", &json!({"kind": "pdf"})).is_err());
    }

    #[test]
    fn test_registered_template() {
        let mut engine = TemplateEngine::new();
        engine.register_template("greeting", "Hi {{who}}").unwrap();
        assert!(engine.has_template("greeting"));

        let result = engine.render_named("greeting", &json!({"who": "there"})).unwrap();
        assert_eq!(result, "Hi there");
        assert!(engine.render_named("missing", &json!({})).is_err());
    }

    #[test]
    fn test_bad_template_is_template_error() {
        let mut engine = TemplateEngine::new();
        let err = engine.register_template("broken", "{{#if ok}}unclosed").unwrap_err();
        assert!(matches!(err, DashError::Template(_)));
    }
}
