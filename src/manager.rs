use super::defaults;
use super::metadata::InstructionTemplate;
use super::template::{parse_instruction, render_instruction};
use super::validation::validate_instruction_file;
use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;

const INSTRUCTION_EXTENSION: &str = ".j2.md";

/// Owns the directory of instruction templates
#[derive(Debug, Clone)]
pub struct InstructionManager {
    instructions_dir: PathBuf,
}

impl InstructionManager {
    /// Create a manager for `instructions_dir`. Nothing touches the disk
    /// until [`init`](Self::init).
    #[must_use]
    pub fn with_dir(instructions_dir: impl Into<PathBuf>) -> Self {
        Self {
            instructions_dir: instructions_dir.into(),
        }
    }

    /// Create the directory and seed any missing default instructions.
    ///
    /// Call this after `with_dir()` before loading anything.
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.instructions_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create instructions directory: {}",
                    self.instructions_dir.display()
                )
            })?;

        match defaults::write_default_instructions(&self.instructions_dir).await {
            Ok(0) => {}
            Ok(written) => info!(
                "Initialized {written} default instructions in {}",
                self.instructions_dir.display()
            ),
            // Not fatal: whatever is already on disk is still usable
            Err(e) => warn!("Failed to initialize default instructions: {e:#}"),
        }

        Ok(())
    }

    /// List every loadable instruction, sorted by name
    pub async fn list_instructions(&self) -> Result<Vec<InstructionTemplate>> {
        let mut instructions = Vec::new();

        let mut entries = fs::read_dir(&self.instructions_dir).await.with_context(|| {
            format!(
                "Failed to read instructions directory: {}",
                self.instructions_dir.display()
            )
        })?;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name
                .to_str()
                .and_then(|f| f.strip_suffix(INSTRUCTION_EXTENSION))
            else {
                continue;
            };

            // One broken file must not hide the rest
            match self.load_instruction(name).await {
                Ok(template) => instructions.push(template),
                Err(e) => warn!("Failed to load instruction '{name}': {e:#}"),
            }
        }

        instructions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(instructions)
    }

    /// Load a specific instruction by name
    pub async fn load_instruction(&self, name: &str) -> Result<InstructionTemplate> {
        validate_instruction_name(name)?;

        let path = self.path_for(name);
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read instruction: {name}"))?;

        validate_instruction_file(&content)
            .with_context(|| format!("Invalid instruction: {name}"))?;
        parse_instruction(name, &content)
    }

    /// Load and render an instruction with parameters
    pub async fn render_instruction(
        &self,
        name: &str,
        parameters: Option<&HashMap<String, serde_json::Value>>,
    ) -> Result<String> {
        let template = self.load_instruction(name).await?;
        render_instruction(&template, parameters)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.instructions_dir
            .join(format!("{name}{INSTRUCTION_EXTENSION}"))
    }
}

/// Validate instruction name to prevent path traversal
fn validate_instruction_name(name: &str) -> Result<()> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        anyhow::bail!(
            "Invalid instruction name: '{name}'. Only alphanumeric characters, hyphens, and underscores allowed."
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{IMAGE_VARIATION, PRODUCT_COPY};
    use serde_json::json;

    #[tokio::test]
    async fn init_seeds_defaults_and_lists_them() {
        let dir = tempfile::tempdir().unwrap();
        let manager = InstructionManager::with_dir(dir.path().join("instructions"));
        manager.init().await.unwrap();

        let names: Vec<_> = manager
            .list_instructions()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, [IMAGE_VARIATION, PRODUCT_COPY]);
    }

    #[tokio::test]
    async fn broken_files_are_skipped_when_listing() {
        let dir = tempfile::tempdir().unwrap();
        let manager = InstructionManager::with_dir(dir.path());
        manager.init().await.unwrap();
        fs::write(dir.path().join("broken.j2.md"), "no frontmatter")
            .await
            .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").await.unwrap();

        assert_eq!(manager.list_instructions().await.unwrap().len(), 2);
        assert!(manager.load_instruction("broken").await.is_err());
    }

    #[tokio::test]
    async fn renders_user_edited_instruction() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(format!("{PRODUCT_COPY}.j2.md")),
            "---\ntitle: Copy\ndescription: Short copy\ncategories: [copy]\nauthor: me\n---\nCopy for {{ category_label }}",
        )
        .await
        .unwrap();
        let manager = InstructionManager::with_dir(dir.path());
        manager.init().await.unwrap();

        let params: HashMap<String, serde_json::Value> =
            serde_json::from_value(json!({"category_label": "Hats"})).unwrap();
        let out = manager
            .render_instruction(PRODUCT_COPY, Some(&params))
            .await
            .unwrap();
        assert_eq!(out.trim(), "Copy for Hats");
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let manager = InstructionManager::with_dir("/tmp/unused");
        assert!(manager.load_instruction("../etc/passwd").await.is_err());
        assert!(manager.load_instruction("").await.is_err());
    }
}
