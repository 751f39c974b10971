use super::metadata::{InstructionMetadata, InstructionTemplate, json_kind};
use anyhow::{Context, Result};
use gray_matter::engine::YAML;
use gray_matter::{Matter, Pod};
use minijinja::Environment;
use std::collections::HashMap;

/// Parse a .j2.md file into metadata and body
pub fn parse_instruction(name: &str, file_content: &str) -> Result<InstructionTemplate> {
    let matter = Matter::<YAML>::new();
    let parsed: gray_matter::ParsedEntity<Pod> = matter
        .parse(file_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse frontmatter: {e}"))?;

    let metadata: InstructionMetadata = parsed
        .data
        .ok_or_else(|| anyhow::anyhow!("No frontmatter found in instruction template"))?
        .deserialize()
        .context("Failed to parse YAML frontmatter")?;

    validate_metadata(&metadata)?;

    Ok(InstructionTemplate {
        name: name.to_string(),
        metadata,
        content: parsed.content,
    })
}

fn validate_metadata(metadata: &InstructionMetadata) -> Result<()> {
    let required = [
        ("title", metadata.title.trim().is_empty()),
        ("description", metadata.description.trim().is_empty()),
        ("categories", metadata.categories.is_empty()),
        ("author", metadata.author.trim().is_empty()),
    ];
    let missing: Vec<_> = required
        .iter()
        .filter(|(_, empty)| *empty)
        .map(|(field, _)| *field)
        .collect();
    if !missing.is_empty() {
        anyhow::bail!("Instruction frontmatter is missing: {}", missing.join(", "));
    }
    Ok(())
}

/// Render an instruction template with parameters.
///
/// Required parameters must be present and every provided parameter that has
/// a definition must match its declared type. Missing optional parameters take
/// their declared default; undeclared parameters are passed through untouched.
pub fn render_instruction(
    template: &InstructionTemplate,
    parameters: Option<&HashMap<String, serde_json::Value>>,
) -> Result<String> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| minijinja::AutoEscape::None);
    env.add_template(&template.name, &template.content)?;

    let ctx = build_context(template, parameters)?;

    let tmpl = env.get_template(&template.name)?;
    let rendered = tmpl
        .render(ctx)
        .with_context(|| format!("Failed to render instruction '{}'", template.name))?;

    Ok(rendered)
}

fn build_context(
    template: &InstructionTemplate,
    parameters: Option<&HashMap<String, serde_json::Value>>,
) -> Result<minijinja::Value> {
    let params = parameters.cloned().unwrap_or_default();

    validate_parameters(template, &params)?;
    let params = apply_defaults(template, params);

    Ok(minijinja::Value::from_serialize(&params))
}

fn validate_parameters(
    template: &InstructionTemplate,
    params: &HashMap<String, serde_json::Value>,
) -> Result<()> {
    for param_def in &template.metadata.parameters {
        match params.get(&param_def.name) {
            Some(value) if !param_def.param_type.accepts(value) => anyhow::bail!(
                "Parameter '{}' of instruction '{}' has wrong type: expected {}, got {}",
                param_def.name,
                template.name,
                param_def.param_type.as_str(),
                json_kind(value)
            ),
            Some(_) => {}
            None if param_def.required => anyhow::bail!(
                "Required parameter '{}' not provided to instruction '{}'. Description: {}",
                param_def.name,
                template.name,
                param_def.description
            ),
            None => {}
        }
    }

    Ok(())
}

fn apply_defaults(
    template: &InstructionTemplate,
    mut params: HashMap<String, serde_json::Value>,
) -> HashMap<String, serde_json::Value> {
    let defaults = template
        .metadata
        .parameters
        .iter()
        .filter_map(|def| def.default.as_ref().map(|value| (&def.name, value)));
    for (name, value) in defaults {
        params.entry(name.clone()).or_insert_with(|| value.clone());
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ParameterType;
    use serde_json::json;

    const GREETING: &str = "---
title: Greeting
description: Says hello
categories: [test]
author: tests
parameters:
  - name: who
    description: Person to greet
    required: true
  - name: times
    description: Repeat count
    param_type: number
    default: 2
---
{% for i in range(times) %}Hello {{ who }}! {% endfor %}";

    fn params(value: serde_json::Value) -> HashMap<String, serde_json::Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn names_every_missing_frontmatter_field() {
        let content = "---\ntitle: ' '\ndescription: d\ncategories: []\nauthor: a\n---\nBody";
        let err = parse_instruction("incomplete", content).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Instruction frontmatter is missing: title, categories"
        );
    }

    #[test]
    fn parses_frontmatter() {
        let template = parse_instruction("greeting", GREETING).unwrap();
        assert_eq!(template.metadata.title, "Greeting");
        assert_eq!(template.metadata.parameters.len(), 2);
        assert_eq!(template.metadata.parameters[1].param_type, ParameterType::Number);
        assert!(template.content.contains("Hello"));
    }

    #[test]
    fn missing_frontmatter_is_an_error() {
        assert!(parse_instruction("bare", "Just a body").is_err());
    }

    #[test]
    fn renders_with_defaults() {
        let template = parse_instruction("greeting", GREETING).unwrap();
        let out = render_instruction(&template, Some(&params(json!({"who": "Ada"})))).unwrap();
        assert_eq!(out.trim(), "Hello Ada! Hello Ada!");
    }

    #[test]
    fn enforces_required_and_types() {
        let template = parse_instruction("greeting", GREETING).unwrap();
        assert!(render_instruction(&template, None).is_err());

        let wrong = params(json!({"who": "Ada", "times": "twice"}));
        let err = render_instruction(&template, Some(&wrong)).unwrap_err();
        assert!(err.to_string().contains("expected number, got string"));

        let nothing = params(json!({"who": "Ada", "times": null}));
        let err = render_instruction(&template, Some(&nothing)).unwrap_err();
        assert!(err.to_string().contains("got null"));
    }
}
