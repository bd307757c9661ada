use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::dtos::folder_dto::{BreadcrumbDto, CreateFolderDto, FolderDto};
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::folder::{is_valid_name, Folder};
use crate::domain::repositories::folder_repository::FolderRepository;
use crate::domain::services::tree_validator::TreeValidator;

/// Service for folder operations
pub struct FolderService {
    folder_repository: Arc<dyn FolderRepository>,
    tree_validator: Arc<TreeValidator>,
}

impl FolderService {
    pub fn new(folder_repository: Arc<dyn FolderRepository>, tree_validator: Arc<TreeValidator>) -> Self {
        Self { folder_repository, tree_validator }
    }

    /// Creates a folder; the parent, when given, must belong to the owner
    #[instrument(skip(self, dto), fields(name = %dto.name))]
    pub async fn create_folder(&self, dto: CreateFolderDto, owner_id: &str) -> Result<FolderDto> {
        let parent_id = dto.parent_id.filter(|id| !id.is_empty());

        if let Some(parent_id) = &parent_id {
            if self.folder_repository.get_folder(parent_id, owner_id).await?.is_none() {
                return Err(DomainError::not_found("Folder", parent_id.clone()));
            }
        }

        let folder = Folder::new(dto.name, parent_id, owner_id.to_string())
            .map_err(|e| DomainError::validation_error("Folder", e.to_string()))?;

        let created = self.folder_repository.create_folder(&folder).await?;
        info!("Folder {} created for user {}", created.id(), owner_id);
        Ok(FolderDto::from(created))
    }

    /// Renames a folder
    #[instrument(skip(self))]
    pub async fn rename_folder(&self, id: &str, new_name: &str, owner_id: &str) -> Result<FolderDto> {
        if !is_valid_name(new_name) {
            return Err(DomainError::validation_error(
                "Folder",
                format!("Invalid folder name: {}", new_name),
            ));
        }

        let folder = self.folder_repository.rename_folder(id, new_name.trim(), owner_id).await?;
        Ok(FolderDto::from(folder))
    }

    pub async fn set_favorite(&self, id: &str, is_favorite: bool, owner_id: &str) -> Result<()> {
        self.folder_repository.set_favorite(id, is_favorite, owner_id).await?;
        Ok(())
    }

    /// Path from the root to `id`: "My Files" first, the folder itself last
    #[instrument(skip(self))]
    pub async fn breadcrumbs(&self, id: &str, owner_id: &str) -> Result<Vec<BreadcrumbDto>> {
        let chain = self.tree_validator.ancestor_chain(id, owner_id).await?;
        if chain.is_empty() {
            return Err(DomainError::not_found("Folder", id));
        }

        let mut crumbs = Vec::with_capacity(chain.len() + 1);
        crumbs.push(BreadcrumbDto::root());
        crumbs.extend(chain.iter().rev().map(BreadcrumbDto::from));
        Ok(crumbs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::ErrorKind;
    use crate::test_support::TestTree;

    fn service(tree: &TestTree) -> FolderService {
        FolderService::new(tree.folders.clone(), Arc::new(tree.validator()))
    }

    #[tokio::test]
    async fn test_create_folder_requires_owned_parent() {
        let tree = TestTree::new();
        let foreign = tree.folder_for("intruder", "X", None).await;

        let err = service(&tree)
            .create_folder(
                CreateFolderDto { name: "Docs".to_string(), parent_id: Some(foreign) },
                TestTree::OWNER,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let created = service(&tree)
            .create_folder(CreateFolderDto { name: " Docs ".to_string(), parent_id: None }, TestTree::OWNER)
            .await
            .unwrap();
        assert_eq!(created.name, "Docs");
        assert_eq!(created.user_id, TestTree::OWNER);
    }

    #[tokio::test]
    async fn test_invalid_names_are_rejected() {
        let tree = TestTree::new();
        let a = tree.folder("A", None).await;

        let err = service(&tree)
            .create_folder(CreateFolderDto { name: "a/b".to_string(), parent_id: None }, TestTree::OWNER)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        let err = service(&tree).rename_folder(&a, "   ", TestTree::OWNER).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_breadcrumbs_start_at_root() {
        let tree = TestTree::new();
        let a = tree.folder("Projects", None).await;
        let b = tree.folder("2024", Some(&a)).await;

        let crumbs = service(&tree).breadcrumbs(&b, TestTree::OWNER).await.unwrap();
        let names: Vec<&str> = crumbs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["My Files", "Projects", "2024"]);
        assert_eq!(crumbs[0].id, None);
        assert_eq!(crumbs[2].id.as_deref(), Some(b.as_str()));

        let err = service(&tree).breadcrumbs("missing", TestTree::OWNER).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
