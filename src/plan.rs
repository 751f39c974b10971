//! Generation plans: the rendered instructions for one garment request.
//!
//! A plan resolves the requested prompt ids, renders the image-variation
//! instruction once per resolved template and renders a single product-copy
//! instruction. Sending the instructions to a model provider is left to the
//! caller.

use super::catalog::PromptTemplate;
use super::defaults::{IMAGE_VARIATION, PRODUCT_COPY};
use super::manager::InstructionManager;
use super::selection::{PromptSelector, PromptSummary};
use super::template::render_instruction;
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Prompt ids in the order the variations should be produced
    #[serde(default)]
    pub prompt_ids: Vec<String>,
    #[serde(default)]
    pub garment_notes: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub max_variations: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlannedVariation {
    pub prompt: PromptSummary,
    pub instruction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPlan {
    pub created_at: DateTime<Utc>,
    pub used_default: bool,
    pub variations: Vec<PlannedVariation>,
    pub copy_instruction: String,
}

pub async fn plan_generation(
    selector: &PromptSelector,
    manager: &InstructionManager,
    request: &GenerationRequest,
) -> Result<GenerationPlan> {
    if request.max_variations == Some(0) {
        anyhow::bail!("max_variations must be at least 1");
    }

    let selection = selector.resolve(&request.prompt_ids);
    let mut templates = selection.templates;
    if let Some(max) = request.max_variations {
        templates.truncate(max);
    }

    let variation_instruction = manager.load_instruction(IMAGE_VARIATION).await?;
    let copy_instruction = manager.load_instruction(PRODUCT_COPY).await?;

    let mut variations = Vec::with_capacity(templates.len());
    for template in &templates {
        let category_label = category_label(selector, template);
        let mut params = HashMap::from([
            ("prompt".to_string(), json!(template.prompt)),
            ("prompt_title".to_string(), json!(template.title)),
            ("prompt_group".to_string(), json!(template.group)),
            ("category_label".to_string(), json!(category_label)),
        ]);
        insert_optional(&mut params, "garment_notes", request.garment_notes.as_deref());

        variations.push(PlannedVariation {
            prompt: PromptSummary::from(template.as_ref()),
            instruction: render_instruction(&variation_instruction, Some(&params))?,
        });
    }

    let copy_label = templates
        .first()
        .map(|template| category_label(selector, template))
        .unwrap_or_else(|| "Apparel".to_string());
    let titles: Vec<&str> = templates.iter().map(|t| t.title.as_str()).collect();
    let mut params = HashMap::from([
        ("category_label".to_string(), json!(copy_label)),
        ("variation_titles".to_string(), json!(titles)),
    ]);
    insert_optional(&mut params, "garment_notes", request.garment_notes.as_deref());
    insert_optional(&mut params, "tone", request.tone.as_deref());
    let copy_instruction = render_instruction(&copy_instruction, Some(&params))?;

    debug!(
        "Planned {} variations (default selection: {})",
        variations.len(),
        selection.used_default
    );

    Ok(GenerationPlan {
        created_at: Utc::now(),
        used_default: selection.used_default,
        variations,
        copy_instruction,
    })
}

fn category_label(selector: &PromptSelector, template: &PromptTemplate) -> String {
    selector
        .catalog()
        .category(&template.category_key())
        .map(|category| category.label.clone())
        .unwrap_or_else(|| template.category_id.clone())
}

fn insert_optional(params: &mut HashMap<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        params.insert(key.to_string(), json!(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CategoryKey};
    use std::sync::Arc;

    async fn fixture() -> (tempfile::TempDir, PromptSelector, InstructionManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = InstructionManager::with_dir(dir.path());
        manager.init().await.unwrap();
        let catalog = Arc::new(Catalog::bundled().unwrap());
        let selector = PromptSelector::new(catalog, &CategoryKey::gendered("female", "upper"));
        (dir, selector, manager)
    }

    #[tokio::test]
    async fn renders_one_instruction_per_variation() {
        let (_dir, selector, manager) = fixture().await;
        let request = GenerationRequest {
            prompt_ids: vec!["hats-on-model-field".into(), "male-upper-studio-front".into()],
            garment_notes: Some("Navy wool, brass buttons".into()),
            tone: Some("playful".into()),
            max_variations: None,
        };

        let plan = plan_generation(&selector, &manager, &request).await.unwrap();
        assert!(!plan.used_default);
        assert_eq!(plan.variations.len(), 2);
        assert_eq!(plan.variations[0].prompt.id, "hats-on-model-field");

        let first = &plan.variations[0].instruction;
        assert!(first.contains("Product category: Hats"));
        assert!(first.contains("Navy wool, brass buttons"));
        assert!(first.contains("open meadow at sunset"));

        assert!(plan.copy_instruction.contains("Tone: playful"));
        assert!(plan.copy_instruction.contains("- Meadow Portrait (Hats)"));
    }

    #[tokio::test]
    async fn empty_request_uses_default_sequence() {
        let (_dir, selector, manager) = fixture().await;
        let plan = plan_generation(&selector, &manager, &GenerationRequest::default())
            .await
            .unwrap();

        assert!(plan.used_default);
        assert_eq!(plan.variations.len(), 5);
        assert!(plan.variations.iter().all(|v| v.prompt.category_id == "upper"));
        assert!(plan.copy_instruction.contains("Tone: confident and warm"));
        assert!(!plan.copy_instruction.contains("Notes from the seller"));
    }

    #[tokio::test]
    async fn caps_variations() {
        let (_dir, selector, manager) = fixture().await;
        let request = GenerationRequest {
            max_variations: Some(2),
            ..Default::default()
        };
        let plan = plan_generation(&selector, &manager, &request).await.unwrap();
        assert_eq!(plan.variations.len(), 2);

        let request = GenerationRequest {
            max_variations: Some(0),
            ..Default::default()
        };
        assert!(plan_generation(&selector, &manager, &request).await.is_err());
    }
}
