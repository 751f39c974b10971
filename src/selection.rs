use super::catalog::{Catalog, CategoryKey, PromptTemplate, Scope};
use super::normalize::DEFAULT_PROMPT_COUNT;
use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Provenance record returned to callers: a template without its prompt text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptSummary {
    pub id: String,
    pub scope: Scope,
    pub owner_id: String,
    pub gender_id: Option<String>,
    pub category_id: String,
    pub group: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub order: usize,
}

impl From<&PromptTemplate> for PromptSummary {
    fn from(template: &PromptTemplate) -> Self {
        Self {
            id: template.id.clone(),
            scope: template.scope,
            owner_id: template.owner_id.clone(),
            gender_id: template.gender_id.clone(),
            category_id: template.category_id.clone(),
            group: template.group.clone(),
            name: template.name.clone(),
            title: template.title.clone(),
            description: template.description.clone(),
            order: template.order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSelection {
    /// Templates in caller order, or the default sequence
    pub templates: Vec<Arc<PromptTemplate>>,
    pub used_default: bool,
}

impl ResolvedSelection {
    pub fn summaries(&self) -> Vec<PromptSummary> {
        self.templates.iter().map(|t| PromptSummary::from(t.as_ref())).collect()
    }
}

/// Resolves caller-supplied prompt ids against a shared catalog.
///
/// The fallback sequence is computed once, when the selector is created.
#[derive(Debug, Clone)]
pub struct PromptSelector {
    catalog: Arc<Catalog>,
    default_sequence: Vec<Arc<PromptTemplate>>,
}

impl PromptSelector {
    pub fn new(catalog: Arc<Catalog>, default_category: &CategoryKey) -> Self {
        let default_sequence = default_sequence(&catalog, default_category);
        Self {
            catalog,
            default_sequence,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn default_sequence(&self) -> &[Arc<PromptTemplate>] {
        &self.default_sequence
    }

    /// Resolve ids in the order given.
    ///
    /// Unknown ids are dropped, repeats keep their first position. When nothing
    /// usable is left the default sequence is returned instead.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> ResolvedSelection {
        let mut seen = HashSet::with_capacity(ids.len());
        let mut templates = Vec::new();
        for id in ids {
            if let Some(template) = self.catalog.prompt(id.as_ref())
                && seen.insert(template.id.as_str())
            {
                templates.push(Arc::clone(template));
            }
        }

        if templates.is_empty() {
            return ResolvedSelection {
                templates: self.default_sequence.clone(),
                used_default: true,
            };
        }

        ResolvedSelection {
            templates,
            used_default: false,
        }
    }
}

fn default_sequence(catalog: &Catalog, key: &CategoryKey) -> Vec<Arc<PromptTemplate>> {
    let from_category: Vec<_> = catalog
        .category(key)
        .map(|category| {
            category
                .default_prompt_ids
                .iter()
                .filter_map(|id| catalog.prompt(id))
                .take(DEFAULT_PROMPT_COUNT)
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    if !from_category.is_empty() {
        return from_category;
    }

    warn!("Default category {key} has no prompts; using the first catalog entries instead");
    catalog
        .prompts_by_id()
        .values()
        .take(DEFAULT_PROMPT_COUNT)
        .cloned()
        .collect()
}
