pub mod authored;
pub mod catalog;
pub mod config;
pub mod defaults;
pub mod manager;
pub mod metadata;
pub mod normalize;
pub mod plan;
pub mod selection;
pub mod template;
pub mod validation;

// Re-export commonly used types
pub use authored::{AuthoredCatalog, load_authored_catalog};
pub use catalog::{
    Catalog, Category, CategoryKey, Gender, PromptGroup, PromptTemplate, Scope, build_catalog,
};
pub use config::StudioConfig;
pub use manager::InstructionManager;
pub use metadata::{InstructionMetadata, InstructionTemplate, ParameterDefinition, ParameterType};
pub use plan::{GenerationPlan, GenerationRequest, PlannedVariation, plan_generation};
pub use selection::{PromptSelector, PromptSummary, ResolvedSelection};

use std::sync::Arc;

/// Everything a request flow needs, built once at startup
#[derive(Debug, Clone)]
pub struct Studio {
    pub selector: PromptSelector,
    pub instructions: InstructionManager,
}

impl Studio {
    /// Build the bundled catalog and prepare the instructions directory.
    ///
    /// The catalog is built synchronously before anything async happens; after
    /// this returns it is only ever read.
    pub async fn start(config: &StudioConfig) -> anyhow::Result<Self> {
        let catalog = Arc::new(Catalog::bundled()?);
        let selector = PromptSelector::new(catalog, &config.default_category);

        let instructions = InstructionManager::with_dir(&config.instructions_dir);
        instructions.init().await?;

        Ok(Self {
            selector,
            instructions,
        })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.selector.catalog()
    }

    pub async fn plan(&self, request: &GenerationRequest) -> anyhow::Result<GenerationPlan> {
        plan_generation(&self.selector, &self.instructions, request).await
    }
}
