// End-to-end: startup, shared catalog reads and generation plans.

use anyhow::Result;
use garment_prompt_catalog::{CategoryKey, GenerationRequest, Studio, StudioConfig};
use std::sync::Arc;

#[tokio::test]
async fn studio_plans_from_bundled_catalog() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = StudioConfig::default()
        .with_instructions_dir(dir.path())
        .with_default_category(CategoryKey::standalone("bags"));
    let studio = Studio::start(&config).await?;

    let defaults: Vec<_> = studio
        .selector
        .default_sequence()
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(defaults, ["bags-product-front", "bags-on-shoulder", "bags-interior"]);

    let plan = studio
        .plan(&GenerationRequest {
            prompt_ids: vec!["female-footwear-pedestal".into()],
            ..Default::default()
        })
        .await?;
    assert_eq!(plan.variations.len(), 1);
    assert!(plan.variations[0].instruction.contains("Product category: Footwear"));
    assert!(plan.copy_instruction.contains("Category: Footwear"));

    let json = serde_json::to_value(&plan)?;
    assert!(json["variations"][0]["prompt"].get("prompt").is_none());
    assert_eq!(json["variations"][0]["prompt"]["genderId"], "female");
    Ok(())
}

#[tokio::test]
async fn concurrent_readers_share_one_catalog() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = StudioConfig::default().with_instructions_dir(dir.path());
    let studio = Arc::new(Studio::start(&config).await?);

    let mut handles = Vec::new();
    for id in ["male-upper-studio-front", "sunglasses-on-face-beach", "hats-product-top"] {
        let studio = Arc::clone(&studio);
        handles.push(tokio::spawn(async move {
            studio.selector.resolve(&[id]).templates[0].id.clone()
        }));
    }

    let mut resolved = Vec::new();
    for handle in handles {
        resolved.push(handle.await?);
    }
    assert_eq!(
        resolved,
        ["male-upper-studio-front", "sunglasses-on-face-beach", "hats-product-top"]
    );
    Ok(())
}
