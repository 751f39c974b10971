use anyhow::{Context, Result};
use log::debug;
use std::path::Path;
use tokio::fs;

/// Authored gendered catalog data embedded at compile time
pub const BUNDLED_GENDERED_CATALOG: &str = include_str!("../data/catalog/gendered.json");

/// Authored standalone catalog data embedded at compile time
pub const BUNDLED_STANDALONE_CATALOG: &str = include_str!("../data/catalog/standalone.json");

/// Instruction rendered once per requested imagery variation
pub const IMAGE_VARIATION: &str = "image_variation";

/// Instruction asking for marketing copy
pub const PRODUCT_COPY: &str = "product_copy";

/// Default instructions embedded at compile time
pub const DEFAULT_INSTRUCTIONS: &[(&str, &str)] = &[
    (
        IMAGE_VARIATION,
        include_str!("../data/instructions/image_variation.j2.md"),
    ),
    (
        PRODUCT_COPY,
        include_str!("../data/instructions/product_copy.j2.md"),
    ),
];

/// Write default instructions to the instructions directory.
///
/// Only writes instructions that don't already exist, so user edits survive.
/// Returns how many files were written.
pub async fn write_default_instructions(instructions_dir: &Path) -> Result<usize> {
    let mut written = 0;

    for (name, content) in DEFAULT_INSTRUCTIONS {
        let path = instructions_dir.join(format!("{name}.j2.md"));

        if !fs::try_exists(&path).await.unwrap_or(false) {
            fs::write(&path, content)
                .await
                .with_context(|| format!("Failed to write default instruction: {name}"))?;

            debug!("Wrote default instruction: {name}");
            written += 1;
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_instruction_file;

    #[test]
    fn embedded_instructions_are_valid() {
        for (name, content) in DEFAULT_INSTRUCTIONS {
            validate_instruction_file(content).unwrap_or_else(|e| panic!("{name}: {e:#}"));
        }
    }

    #[tokio::test]
    async fn does_not_overwrite_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join(format!("{PRODUCT_COPY}.j2.md"));
        fs::write(&custom, "custom").await.unwrap();

        let written = write_default_instructions(dir.path()).await.unwrap();
        assert_eq!(written, 1);
        assert_eq!(fs::read_to_string(&custom).await.unwrap(), "custom");
        assert!(dir.path().join(format!("{IMAGE_VARIATION}.j2.md")).exists());

        assert_eq!(write_default_instructions(dir.path()).await.unwrap(), 0);
    }
}
