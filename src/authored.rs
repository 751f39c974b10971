//! Hand-authored catalog data as it appears in the JSON data files.
//!
//! Object key order in the data files is authoring order, so every map here is
//! an `IndexMap`. Nothing in this module derives ids or titles; that happens in
//! [`crate::catalog::build_catalog`].

use super::catalog::{Catalog, build_catalog};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;

/// Gender id -> authored gender
pub type AuthoredGendered = IndexMap<String, AuthoredGender>;

/// Standalone category id -> authored category
pub type AuthoredStandalone = IndexMap<String, AuthoredCategory>;

/// One prompt entry inside an authored group
#[derive(Debug, Clone, Deserialize)]
pub struct AuthoredPrompt {
    pub name: String,
    pub prompt: String,
    #[serde(default, alias = "idSuffix")]
    pub id_suffix: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl AuthoredPrompt {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            id_suffix: None,
            title: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.id_suffix = Some(suffix.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A category: label, optional default suffixes and its groups in order
#[derive(Debug, Clone, Deserialize)]
pub struct AuthoredCategory {
    pub label: String,
    #[serde(default, alias = "defaultPromptSuffixes")]
    pub default_prompt_suffixes: Option<Vec<String>>,
    #[serde(default)]
    pub groups: IndexMap<String, Vec<AuthoredPrompt>>,
}

impl AuthoredCategory {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            default_prompt_suffixes: None,
            groups: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_group(mut self, label: impl Into<String>, prompts: Vec<AuthoredPrompt>) -> Self {
        self.groups.insert(label.into(), prompts);
        self
    }

    #[must_use]
    pub fn with_default_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_prompt_suffixes = Some(suffixes.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthoredGender {
    pub label: String,
    #[serde(default)]
    pub categories: IndexMap<String, AuthoredCategory>,
}

impl AuthoredGender {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            categories: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, id: impl Into<String>, category: AuthoredCategory) -> Self {
        self.categories.insert(id.into(), category);
        self
    }
}

/// Both halves of the authored data
#[derive(Debug, Clone, Default)]
pub struct AuthoredCatalog {
    pub gendered: AuthoredGendered,
    pub standalone: AuthoredStandalone,
}

impl AuthoredCatalog {
    /// Normalize into an indexed [`Catalog`]
    pub fn build(&self) -> Result<Catalog> {
        build_catalog(&self.gendered, &self.standalone)
    }
}

/// Parse the gendered and standalone JSON documents
pub fn load_authored_catalog(
    gendered_json: &str,
    standalone_json: &str,
) -> Result<AuthoredCatalog> {
    let gendered: AuthoredGendered =
        serde_json::from_str(gendered_json).context("Failed to parse gendered catalog data")?;
    let standalone: AuthoredStandalone =
        serde_json::from_str(standalone_json).context("Failed to parse standalone catalog data")?;

    Ok(AuthoredCatalog {
        gendered,
        standalone,
    })
}
