use super::catalog::CategoryKey;
use anyhow::Result;
use std::path::PathBuf;

/// Category whose defaults are used when a request selects nothing usable
pub const DEFAULT_SELECTION_CATEGORY: (&str, &str) = ("female", "upper");

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub instructions_dir: PathBuf,
    pub default_category: CategoryKey,
}

impl Default for StudioConfig {
    fn default() -> Self {
        let (gender, category) = DEFAULT_SELECTION_CATEGORY;
        Self {
            instructions_dir: default_instructions_dir()
                .unwrap_or_else(|_| PathBuf::from(".garment-studio/instructions")),
            default_category: CategoryKey::gendered(gender, category),
        }
    }
}

impl StudioConfig {
    #[must_use]
    pub fn with_instructions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.instructions_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_default_category(mut self, key: CategoryKey) -> Self {
        self.default_category = key;
        self
    }
}

/// `~/.garment-studio/instructions`
pub fn default_instructions_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;

    Ok(home.join(".garment-studio").join("instructions"))
}
