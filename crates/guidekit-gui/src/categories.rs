//! Category operations for the content manager.

use guidekit_core::{Category, CategoryPatch};

use crate::deps::ManagerDeps;
use crate::error::GuiError;
use crate::mutator::{OptimisticMutator, require_saved};

/// Category operations handler.
pub struct CategoryOps<'a> {
    deps: &'a ManagerDeps,
    list: &'a OptimisticMutator<Category>,
}

impl<'a> CategoryOps<'a> {
    pub fn new(deps: &'a ManagerDeps, list: &'a OptimisticMutator<Category>) -> Self {
        Self { deps, list }
    }

    /// Fetch categories from the backend, replacing the local list.
    pub async fn load(&self) -> Result<Vec<Category>, GuiError> {
        let categories = self
            .deps
            .repository
            .list_categories(self.deps.content_type())
            .await?;
        tracing::debug!(count = categories.len(), "Categories loaded");
        self.list.replace_all(categories.clone());
        Ok(categories)
    }

    /// Create a category. Shown immediately under a temporary id.
    pub async fn create(&self, name: &str, description: &str) -> Result<Category, GuiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GuiError::ValidationFailed(
                "Category name is required".to_string(),
            ));
        }

        let repository = &self.deps.repository;
        let content_type = self.deps.content_type();
        let draft = Category::draft(name, description.trim());
        let created = self
            .list
            .create(draft, |record| async move {
                repository.create_category(content_type, &record).await
            })
            .await?;
        tracing::info!(id = %created.id, name = %created.name, "Category created");
        Ok(created)
    }

    /// Apply `patch` to a category.
    pub async fn update(&self, id: &str, patch: &CategoryPatch) -> Result<Category, GuiError> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(GuiError::ValidationFailed(
                "Category name is required".to_string(),
            ));
        }

        let id = self.saved_id(id)?;
        let repository = &self.deps.repository;
        let content_type = self.deps.content_type();
        let updated = self
            .list
            .update(&id, patch, |record| async move {
                repository.update_category(content_type, &record).await
            })
            .await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), GuiError> {
        let id = self.saved_id(id)?;
        let repository = &self.deps.repository;
        let content_type = self.deps.content_type();
        self.list
            .delete(&id, |id| async move {
                repository.delete_category(content_type, &id).await
            })
            .await?;
        tracing::info!(%id, "Category deleted");
        Ok(())
    }

    pub async fn toggle_published(&self, id: &str) -> Result<Category, GuiError> {
        let id = self.saved_id(id)?;
        let repository = &self.deps.repository;
        let content_type = self.deps.content_type();
        Ok(self
            .list
            .toggle_published(&id, |record| async move {
                repository.update_category(content_type, &record).await
            })
            .await?)
    }

    pub async fn toggle_premium(&self, id: &str) -> Result<Category, GuiError> {
        let id = self.saved_id(id)?;
        let repository = &self.deps.repository;
        let content_type = self.deps.content_type();
        Ok(self
            .list
            .toggle_premium(&id, |record| async move {
                repository.update_category(content_type, &record).await
            })
            .await?)
    }

    /// Server id for `id`, refusing records whose create has not settled.
    fn saved_id(&self, id: &str) -> Result<String, GuiError> {
        let id = self.list.resolve_id(id);
        require_saved::<Category>(&id)?;
        Ok(id)
    }
}
