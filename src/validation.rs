use super::authored::AuthoredPrompt;
use anyhow::Result;
use lazy_static::lazy_static;
use minijinja::Environment;
use regex::Regex;

/// Maximum instruction template size in bytes (1MB)
const MAX_TEMPLATE_SIZE: usize = 1_000_000;

/// Gender id reserved for the standalone half of composite keys
pub const RESERVED_GENDER_ID: &str = "standalone";

/// Validate `MiniJinja` template syntax
pub fn validate_template_syntax(content: &str) -> Result<()> {
    let mut env = Environment::new();

    // Try to add template - will fail if syntax invalid
    env.add_template("_validation", content)
        .map_err(|e| anyhow::anyhow!("Template syntax error: {e}"))?;

    Ok(())
}

/// Validate a complete instruction file (frontmatter + body)
pub fn validate_instruction_file(content: &str) -> Result<()> {
    if content.len() > MAX_TEMPLATE_SIZE {
        anyhow::bail!(
            "Template too large ({} bytes). Maximum size is {} bytes (1MB).",
            content.len(),
            MAX_TEMPLATE_SIZE
        );
    }

    let template = super::template::parse_instruction("_validation", content)?;

    validate_template_syntax(&template.content)?;
    validate_no_dangerous_operations(&template.content)?;

    Ok(())
}

lazy_static! {
    /// Any tag that would load another template, with or without whitespace control
    static ref LOADER_DIRECTIVE: Regex =
        Regex::new(r"\{%[-+]?\s*(include|extends|import|from)\s+")
            .expect("Failed to compile loader directive pattern");
}

/// Instruction templates are rendered without a loader, so anything that
/// would pull in another template is refused.
fn validate_no_dangerous_operations(content: &str) -> Result<()> {
    if let Some(captures) = LOADER_DIRECTIVE.captures(content) {
        let start = captures.get(0).map_or(0, |m| m.start());
        let line = content[..start].matches('\n').count() + 1;
        anyhow::bail!(
            "Instruction template uses forbidden '{}' directive on line {line}. \
             Instructions must be self-contained.",
            &captures[1]
        );
    }
    Ok(())
}

/// Validate a gender or category id. Any text is accepted as long as the
/// `gender:category` form of its [`CategoryKey`](crate::CategoryKey) parses
/// back to the same key.
pub fn validate_catalog_id(kind: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        anyhow::bail!("Invalid {kind} id: '{id}'. Ids cannot be empty.");
    }
    if id.trim() != id {
        anyhow::bail!("Invalid {kind} id: '{id}'. Ids cannot start or end with whitespace.");
    }
    Ok(())
}

/// Validate a gender id, which also separates the two halves of a key
pub fn validate_gender_id(id: &str) -> Result<()> {
    validate_catalog_id("gender", id)?;
    if id.contains(':') {
        anyhow::bail!("Invalid gender id: '{id}'. ':' separates gender and category in keys.");
    }
    if id == RESERVED_GENDER_ID {
        anyhow::bail!("Gender id '{RESERVED_GENDER_ID}' is reserved for standalone categories");
    }
    Ok(())
}

/// Validate one authored prompt entry
pub fn validate_authored_prompt(entry: &AuthoredPrompt) -> Result<()> {
    if entry.name.trim().is_empty() {
        anyhow::bail!("Prompt name cannot be empty");
    }
    if entry.prompt.trim().is_empty() {
        anyhow::bail!("Prompt text cannot be empty (prompt '{}')", entry.name);
    }
    Ok(())
}
