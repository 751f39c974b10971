//! The normalized prompt catalog.
//!
//! [`build_catalog`] turns the authored gender -> category -> group -> prompt
//! tree into flat, indexed records with deterministic ids. The result is
//! immutable: share it behind an `Arc` and read it from as many request flows
//! as needed.

use super::authored::{
    AuthoredCategory, AuthoredGendered, AuthoredStandalone, load_authored_catalog,
};
use super::defaults::{BUNDLED_GENDERED_CATALOG, BUNDLED_STANDALONE_CATALOG};
use super::normalize::{
    DEFAULT_PROMPT_COUNT, build_prompt_id, derive_description, derive_title, slugify,
};
use super::validation::{
    RESERVED_GENDER_ID, validate_authored_prompt, validate_catalog_id, validate_gender_id,
};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Whether a template lives under a gender or in a standalone accessory category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Gendered,
    Standalone,
}

/// Composite lookup key for a category.
///
/// The string form is `gender:category` or `standalone:category`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryKey {
    Gendered { gender: String, category: String },
    Standalone(String),
}

impl CategoryKey {
    pub fn gendered(gender: impl Into<String>, category: impl Into<String>) -> Self {
        Self::Gendered {
            gender: gender.into(),
            category: category.into(),
        }
    }

    pub fn standalone(category: impl Into<String>) -> Self {
        Self::Standalone(category.into())
    }

    pub fn scope(&self) -> Scope {
        match self {
            Self::Gendered { .. } => Scope::Gendered,
            Self::Standalone(_) => Scope::Standalone,
        }
    }

    /// Parse `male:upper` or `standalone:hats`
    pub fn parse(value: &str) -> Result<Self> {
        let (owner, category) = value.split_once(':').ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid category key: '{value}'. \
                 Expected 'gender:category' or 'standalone:category'."
            )
        })?;
        let (owner, category) = (owner.trim(), category.trim());
        if owner.is_empty() || category.is_empty() {
            anyhow::bail!("Invalid category key: '{value}'. Both parts must be non-empty.");
        }

        Ok(if owner == RESERVED_GENDER_ID {
            Self::standalone(category)
        } else {
            Self::gendered(owner, category)
        })
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gendered { gender, category } => write!(f, "{gender}:{category}"),
            Self::Standalone(category) => write!(f, "{RESERVED_GENDER_ID}:{category}"),
        }
    }
}

impl FromStr for CategoryKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One generation directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: String,
    pub scope: Scope,
    /// Gender id for gendered templates, category id for standalone ones
    pub owner_id: String,
    /// Owning gender, `None` for standalone templates
    pub gender_id: Option<String>,
    pub category_id: String,
    pub group: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub prompt: String,
    /// Zero-based position within its group
    pub order: usize,
}

impl PromptTemplate {
    /// Key of the category this template belongs to
    pub fn category_key(&self) -> CategoryKey {
        match self.scope {
            Scope::Gendered => CategoryKey::gendered(&self.owner_id, &self.category_id),
            Scope::Standalone => CategoryKey::standalone(&self.category_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptGroup {
    pub id: String,
    pub label: String,
    pub prompts: Vec<Arc<PromptTemplate>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub label: String,
    pub scope: Scope,
    pub owner_id: String,
    pub groups: Vec<PromptGroup>,
    /// All templates of all groups, in group order
    pub prompts: Vec<Arc<PromptTemplate>>,
    pub has_prompts: bool,
    pub default_prompt_ids: Vec<String>,
}

impl Category {
    pub fn key(&self) -> CategoryKey {
        match self.scope {
            Scope::Gendered => CategoryKey::gendered(&self.owner_id, &self.id),
            Scope::Standalone => CategoryKey::standalone(&self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gender {
    pub id: String,
    pub label: String,
    pub categories: Vec<Arc<Category>>,
}

#[derive(Debug)]
pub struct Catalog {
    genders: Vec<Gender>,
    standalone_categories: Vec<Arc<Category>>,
    prompts_by_id: IndexMap<String, Arc<PromptTemplate>>,
    category_lookup: HashMap<CategoryKey, Arc<Category>>,
    standalone_lookup: HashMap<String, Arc<Category>>,
}

impl Catalog {
    /// Build the catalog from the data files embedded in the crate
    pub fn bundled() -> Result<Self> {
        load_authored_catalog(BUNDLED_GENDERED_CATALOG, BUNDLED_STANDALONE_CATALOG)?
            .build()
            .context("Failed to build bundled prompt catalog")
    }

    pub fn genders(&self) -> &[Gender] {
        &self.genders
    }

    pub fn gender(&self, id: &str) -> Option<&Gender> {
        self.genders.iter().find(|gender| gender.id == id)
    }

    pub fn standalone_categories(&self) -> &[Arc<Category>] {
        &self.standalone_categories
    }

    /// Every template, keyed by id, in build order
    pub fn prompts_by_id(&self) -> &IndexMap<String, Arc<PromptTemplate>> {
        &self.prompts_by_id
    }

    pub fn prompt(&self, id: &str) -> Option<&Arc<PromptTemplate>> {
        self.prompts_by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.prompts_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts_by_id.is_empty()
    }

    pub fn category(&self, key: &CategoryKey) -> Option<&Arc<Category>> {
        self.category_lookup.get(key)
    }

    /// Gendered category lookup; `None` is an expected outcome
    pub fn resolve_category(&self, gender_id: &str, category_id: &str) -> Option<&Arc<Category>> {
        self.category(&CategoryKey::gendered(gender_id, category_id))
    }

    pub fn resolve_standalone_category(&self, category_id: &str) -> Option<&Arc<Category>> {
        self.standalone_lookup.get(category_id)
    }

    /// Flat prompt list of a category, empty when the key is unknown
    pub fn prompts_for_selection(&self, key: &CategoryKey) -> &[Arc<PromptTemplate>] {
        self.category(key)
            .map(|category| category.prompts.as_slice())
            .unwrap_or_default()
    }

    /// Every category key, gendered first, in authoring order
    pub fn category_keys(&self) -> impl Iterator<Item = CategoryKey> + '_ {
        self.genders
            .iter()
            .flat_map(|gender| gender.categories.iter())
            .chain(self.standalone_categories.iter())
            .map(|category| category.key())
    }
}

/// Normalize authored data into an indexed [`Catalog`].
///
/// Fails when an entry is malformed or when two entries produce the same id.
/// The same input always yields the same ids and ordering.
pub fn build_catalog(
    gendered: &AuthoredGendered,
    standalone: &AuthoredStandalone,
) -> Result<Catalog> {
    let mut registry = Registry::default();

    let mut genders = Vec::with_capacity(gendered.len());
    for (gender_id, authored_gender) in gendered {
        validate_gender_id(gender_id)?;

        let mut categories = Vec::with_capacity(authored_gender.categories.len());
        for (category_id, authored) in &authored_gender.categories {
            let category = normalize_category(Scope::Gendered, gender_id, category_id, authored)
                .with_context(|| format!("Invalid category '{gender_id}:{category_id}'"))?;
            let category = registry.insert(category)?;
            categories.push(category);
        }

        genders.push(Gender {
            id: gender_id.clone(),
            label: authored_gender.label.clone(),
            categories,
        });
    }

    let mut standalone_categories = Vec::with_capacity(standalone.len());
    let mut standalone_lookup = HashMap::with_capacity(standalone.len());
    for (category_id, authored) in standalone {
        let category = normalize_category(Scope::Standalone, category_id, category_id, authored)
            .with_context(|| format!("Invalid category '{RESERVED_GENDER_ID}:{category_id}'"))?;
        let category = registry.insert(category)?;
        standalone_lookup.insert(category_id.clone(), Arc::clone(&category));
        standalone_categories.push(category);
    }

    info!(
        "Built prompt catalog: {} genders, {} standalone categories, {} prompts",
        genders.len(),
        standalone_categories.len(),
        registry.prompts_by_id.len()
    );

    Ok(Catalog {
        genders,
        standalone_categories,
        prompts_by_id: registry.prompts_by_id,
        category_lookup: registry.category_lookup,
        standalone_lookup,
    })
}

#[derive(Default)]
struct Registry {
    prompts_by_id: IndexMap<String, Arc<PromptTemplate>>,
    category_lookup: HashMap<CategoryKey, Arc<Category>>,
}

impl Registry {
    fn insert(&mut self, category: Category) -> Result<Arc<Category>> {
        let key = category.key();

        for template in &category.prompts {
            if self.prompts_by_id.contains_key(&template.id) {
                anyhow::bail!(
                    "Duplicate prompt id '{}' (prompt '{}' in {key}). Give it a unique id_suffix.",
                    template.id,
                    template.name
                );
            }
            self.prompts_by_id
                .insert(template.id.clone(), Arc::clone(template));
        }

        if !category.has_prompts {
            debug!("Category {key} has no prompts yet");
        }

        let category = Arc::new(category);
        self.category_lookup.insert(key, Arc::clone(&category));
        Ok(category)
    }
}

fn normalize_category(
    scope: Scope,
    owner_id: &str,
    category_id: &str,
    authored: &AuthoredCategory,
) -> Result<Category> {
    validate_catalog_id("category", category_id)?;

    let gender_id = match scope {
        Scope::Gendered => Some(owner_id.to_string()),
        Scope::Standalone => None,
    };

    let mut groups = Vec::with_capacity(authored.groups.len());
    let mut prompts: Vec<Arc<PromptTemplate>> = Vec::new();

    for (group_label, entries) in &authored.groups {
        let mut group_prompts = Vec::with_capacity(entries.len());

        for (order, entry) in entries.iter().enumerate() {
            validate_authored_prompt(entry)
                .with_context(|| format!("Invalid prompt in group '{group_label}'"))?;

            // Positional serials count across the whole category so that
            // unsuffixed entries in different groups never share an id.
            let position = prompts.len();
            let template = Arc::new(PromptTemplate {
                id: build_prompt_id(
                    scope,
                    owner_id,
                    category_id,
                    entry.id_suffix.as_deref(),
                    position,
                ),
                scope,
                owner_id: owner_id.to_string(),
                gender_id: gender_id.clone(),
                category_id: category_id.to_string(),
                group: group_label.clone(),
                name: entry.name.clone(),
                title: entry
                    .title
                    .clone()
                    .unwrap_or_else(|| derive_title(&entry.name, &authored.label)),
                description: entry
                    .description
                    .clone()
                    .unwrap_or_else(|| derive_description(&entry.prompt)),
                prompt: entry.prompt.clone(),
                order,
            });

            group_prompts.push(Arc::clone(&template));
            prompts.push(template);
        }

        groups.push(PromptGroup {
            id: slugify(group_label),
            label: group_label.clone(),
            prompts: group_prompts,
        });
    }

    let default_prompt_ids = derive_default_prompt_ids(
        scope,
        owner_id,
        category_id,
        authored.default_prompt_suffixes.as_deref(),
        &prompts,
    );

    Ok(Category {
        id: category_id.to_string(),
        label: authored.label.clone(),
        scope,
        owner_id: owner_id.to_string(),
        groups,
        has_prompts: !prompts.is_empty(),
        prompts,
        default_prompt_ids,
    })
}

/// Authored default suffixes that resolve to real templates, otherwise the
/// first [`DEFAULT_PROMPT_COUNT`] templates in flat order.
fn derive_default_prompt_ids(
    scope: Scope,
    owner_id: &str,
    category_id: &str,
    suffixes: Option<&[String]>,
    prompts: &[Arc<PromptTemplate>],
) -> Vec<String> {
    if let Some(suffixes) = suffixes {
        let known: HashSet<&str> = prompts.iter().map(|p| p.id.as_str()).collect();
        let ids: Vec<String> = suffixes
            .iter()
            .enumerate()
            .map(|(index, suffix)| {
                build_prompt_id(scope, owner_id, category_id, Some(suffix.as_str()), index)
            })
            .filter(|id| known.contains(id.as_str()))
            .collect();

        if !ids.is_empty() {
            return ids;
        }
        debug!("No authored default suffix of {owner_id}/{category_id} matched a prompt");
    }

    prompts
        .iter()
        .take(DEFAULT_PROMPT_COUNT)
        .map(|p| p.id.clone())
        .collect()
}
