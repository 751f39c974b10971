// Garment prompt catalog CLI
//
// Browses the bundled prompt catalog, resolves prompt selections and renders
// generation plans. Every command prints a one-line summary followed by JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use garment_prompt_catalog::{
    Catalog, Category, CategoryKey, GenerationPlan, GenerationRequest, PromptTemplate, Studio,
    StudioConfig,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "garment-catalog")]
#[command(about = "Browse garment prompt templates and build generation plans")]
struct Cli {
    /// Directory holding instruction templates (defaults to ~/.garment-studio/instructions).
    #[arg(long, global = true)]
    instructions_dir: Option<PathBuf>,
    /// Category whose defaults apply to empty selections, e.g. female:upper.
    #[arg(long, global = true)]
    default_category: Option<CategoryKey>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List genders, their categories and the standalone categories.
    Categories,
    /// Show the grouped prompts of one category (male:upper, standalone:hats).
    Prompts { key: CategoryKey },
    /// Resolve prompt ids in the given order.
    Resolve { ids: Vec<String> },
    /// Render the generation instructions for a selection.
    Plan {
        ids: Vec<String>,
        /// Notes about the garment passed to every instruction.
        #[arg(long)]
        notes: Option<String>,
        /// Voice of the marketing copy.
        #[arg(long)]
        tone: Option<String>,
        #[arg(long)]
        max_variations: Option<usize>,
    },
    /// Print JSON schemas of the prompt template and generation plan records.
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = StudioConfig::default();
    if let Some(dir) = cli.instructions_dir {
        config = config.with_instructions_dir(dir);
    }
    if let Some(key) = cli.default_category {
        config = config.with_default_category(key);
    }

    let start = Instant::now();
    let studio = Studio::start(&config).await?;
    let catalog = studio.catalog();

    let (summary, result) = match cli.command {
        Command::Categories => {
            let result = categories_json(catalog);
            (format!("Categories: {}", catalog.category_keys().count()), result)
        }
        Command::Prompts { key } => match catalog.category(&key) {
            Some(category) if category.has_prompts => (
                format!("Prompts in {key}: {}", category.prompts.len()),
                category_json(category),
            ),
            _ => (
                format!("Prompt templates for {key} are not available yet"),
                json!({ "key": key.to_string(), "groups": [], "prompts": [] }),
            ),
        },
        Command::Resolve { ids } => {
            let selection = studio.selector.resolve(&ids);
            let summary = format!(
                "Resolved: {} · Default selection: {}",
                selection.templates.len(),
                selection.used_default
            );
            (summary, serde_json::to_value(&selection)?)
        }
        Command::Plan {
            ids,
            notes,
            tone,
            max_variations,
        } => {
            let request = GenerationRequest {
                prompt_ids: ids,
                garment_notes: notes,
                tone,
                max_variations,
            };
            let plan = studio.plan(&request).await?;
            let summary = format!(
                "Planned variations: {} · Default selection: {}",
                plan.variations.len(),
                plan.used_default
            );
            (summary, serde_json::to_value(&plan)?)
        }
        Command::Schema => (
            "Schemas: PromptTemplate, GenerationRequest, GenerationPlan".to_string(),
            json!({
                "promptTemplate": schemars::schema_for!(PromptTemplate),
                "generationRequest": schemars::schema_for!(GenerationRequest),
                "generationPlan": schemars::schema_for!(GenerationPlan),
            }),
        ),
    };

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    println!("\x1b[36m{summary}\x1b[0m · Elapsed: {elapsed_ms:.0}ms");
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn categories_json(catalog: &Catalog) -> Value {
    let genders: Vec<_> = catalog
        .genders()
        .iter()
        .map(|gender| {
            let categories: Vec<_> = gender.categories.iter().map(|c| category_entry(c)).collect();
            json!({
                "id": gender.id,
                "label": gender.label,
                "categories": categories,
            })
        })
        .collect();
    let standalone: Vec<_> = catalog
        .standalone_categories()
        .iter()
        .map(|c| category_entry(c))
        .collect();

    json!({
        "genders": genders,
        "standaloneCategories": standalone,
        "totalPrompts": catalog.len(),
    })
}

fn category_entry(category: &Category) -> Value {
    json!({
        "key": category.key().to_string(),
        "label": category.label,
        "hasPrompts": category.has_prompts,
        "count": category.prompts.len(),
        "defaultPromptIds": category.default_prompt_ids,
    })
}

fn category_json(category: &Category) -> Value {
    let groups: Vec<_> = category
        .groups
        .iter()
        .map(|group| {
            json!({
                "id": group.id,
                "label": group.label,
                "prompts": group.prompts.iter().map(|p| json!({
                    "id": p.id,
                    "title": p.title,
                    "description": p.description,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "key": category.key().to_string(),
        "label": category.label,
        "groups": groups,
        "defaultPromptIds": category.default_prompt_ids,
    })
}
