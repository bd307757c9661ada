use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, error, instrument};

use crate::common::errors::DomainError;
use crate::domain::entities::file::File;
use crate::domain::entities::folder::Folder;
use crate::domain::repositories::file_repository::{FileRepository, FileRepositoryError};
use crate::domain::repositories::folder_repository::{FolderRepository, FolderRepositoryError, ListScope};

/// Why a folder move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    /// The target parent is the folder itself
    SelfMove,
    /// The target parent is a descendant of the folder
    CyclicMove,
    /// The target, or one of its ancestors, is missing or owned by someone else
    NotFound,
}

impl MoveRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            MoveRejection::SelfMove => "Cannot move a folder into itself",
            MoveRejection::CyclicMove => "Cannot move a folder into its own subfolder",
            MoveRejection::NotFound => "Target folder not found",
        }
    }
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCheck {
    Allowed,
    Rejected(MoveRejection),
}

/// Failures of a tree walk. These are never user-facing rejections.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A lookup or listing against the record store failed
    #[error("Store failure while walking the folder tree: {0}")]
    Store(String),

    /// The stored parent references contain a cycle or an impossibly long chain
    #[error("Folder hierarchy of {owner_id} is inconsistent: {detail}")]
    CorruptHierarchy { owner_id: String, detail: String },
}

impl From<FolderRepositoryError> for TreeError {
    fn from(err: FolderRepositoryError) -> Self {
        TreeError::Store(err.to_string())
    }
}

impl From<FileRepositoryError> for TreeError {
    fn from(err: FileRepositoryError) -> Self {
        TreeError::Store(err.to_string())
    }
}

impl From<TreeError> for DomainError {
    fn from(err: TreeError) -> Self {
        DomainError::internal_error("FolderTree", err.to_string())
    }
}

/// Everything found below a set of folders, used before a permanent delete
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubtreeContents {
    /// Visited folder ids, parents always before their children
    pub folder_ids: Vec<String>,
    pub file_ids: Vec<String>,
    /// Blob keys of every file in `file_ids`, same order
    pub storage_paths: Vec<String>,
}

/// Result of walking parent references upwards
#[derive(Debug)]
enum AncestorWalk {
    /// Chain ended at a root folder. Starts with the start folder itself.
    Reached(Vec<Folder>),
    /// The stop id was found in the chain
    Stopped,
    /// A referenced folder was missing; holds what was collected so far
    Broken(Vec<Folder>),
}

/// Validates folder moves and enumerates subtrees over the record store.
///
/// Owns no state: every answer comes from point lookups and listings,
/// issued one per ancestor hop (sequential, each hop needs the previous
/// one) or one per folder level (concurrent, siblings are independent).
pub struct TreeValidator {
    folder_repository: Arc<dyn FolderRepository>,
    file_repository: Arc<dyn FileRepository>,
    max_parallel_listings: usize,
}

impl TreeValidator {
    pub fn new(
        folder_repository: Arc<dyn FolderRepository>,
        file_repository: Arc<dyn FileRepository>,
        max_parallel_listings: usize,
    ) -> Self {
        Self {
            folder_repository,
            file_repository,
            max_parallel_listings: max_parallel_listings.max(1),
        }
    }

    /// Decides whether `folder_id` may be placed under `target_parent_id`.
    ///
    /// Moving to the root (`None`) never walks the tree.
    #[instrument(skip(self))]
    pub async fn can_move(
        &self,
        folder_id: &str,
        target_parent_id: Option<&str>,
        owner_id: &str,
    ) -> Result<MoveCheck, TreeError> {
        let Some(target_id) = target_parent_id else {
            return Ok(MoveCheck::Allowed);
        };

        if target_id == folder_id {
            return Ok(MoveCheck::Rejected(MoveRejection::SelfMove));
        }

        let check = match self.walk_up(target_id, owner_id, Some(folder_id)).await? {
            AncestorWalk::Reached(_) => MoveCheck::Allowed,
            AncestorWalk::Stopped => MoveCheck::Rejected(MoveRejection::CyclicMove),
            AncestorWalk::Broken(_) => MoveCheck::Rejected(MoveRejection::NotFound),
        };

        debug!("Move check for folder {} under {}: {:?}", folder_id, target_id, check);
        Ok(check)
    }

    /// The folder followed by its ancestors up to the root. Empty when the
    /// folder does not exist for the owner. A dangling parent reference
    /// ends the chain early.
    #[instrument(skip(self))]
    pub async fn ancestor_chain(&self, folder_id: &str, owner_id: &str) -> Result<Vec<Folder>, TreeError> {
        match self.walk_up(folder_id, owner_id, None).await? {
            AncestorWalk::Reached(chain) | AncestorWalk::Broken(chain) => Ok(chain),
            AncestorWalk::Stopped => Ok(Vec::new()),
        }
    }

    /// Blob paths of every file transitively contained in `folder_ids`.
    /// Each path appears once even when the inputs overlap.
    pub async fn collect_descendant_paths(
        &self,
        folder_ids: &[String],
        owner_id: &str,
    ) -> Result<Vec<String>, TreeError> {
        Ok(self.collect_subtree(folder_ids, owner_id).await?.storage_paths)
    }

    /// Breadth-first enumeration of the folders and files below
    /// `root_ids`, the roots included. Trashed records are part of the
    /// result. Any failed listing aborts the whole collection.
    #[instrument(skip(self, root_ids), fields(roots = root_ids.len()))]
    pub async fn collect_subtree(
        &self,
        root_ids: &[String],
        owner_id: &str,
    ) -> Result<SubtreeContents, TreeError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut contents = SubtreeContents::default();

        let mut frontier: Vec<String> = root_ids
            .iter()
            .filter(|id| visited.insert((*id).clone()))
            .cloned()
            .collect();

        while !frontier.is_empty() {
            contents.folder_ids.extend(frontier.iter().cloned());

            let levels: Vec<(Vec<File>, Vec<Folder>)> = stream::iter(frontier.clone().into_iter())
                .map(|folder_id| async move { self.list_level(&folder_id, owner_id).await })
                .buffered(self.max_parallel_listings)
                .try_collect()
                .await?;

            let mut next = Vec::new();
            for (files, children) in levels {
                for file in files {
                    contents.file_ids.push(file.id().to_string());
                    contents.storage_paths.push(file.storage_path().to_string());
                }
                for child in children {
                    if visited.insert(child.id().to_string()) {
                        next.push(child.id().to_string());
                    }
                }
            }

            frontier = next;
        }

        debug!(
            "Collected {} folders and {} files for owner {}",
            contents.folder_ids.len(),
            contents.file_ids.len(),
            owner_id
        );

        Ok(contents)
    }

    async fn list_level(&self, folder_id: &str, owner_id: &str) -> Result<(Vec<File>, Vec<Folder>), TreeError> {
        let (files, children) = tokio::try_join!(
            async {
                self.file_repository
                    .list_files(Some(folder_id), owner_id, ListScope::All)
                    .await
                    .map_err(TreeError::from)
            },
            async {
                self.folder_repository
                    .list_children(Some(folder_id), owner_id, ListScope::All)
                    .await
                    .map_err(TreeError::from)
            },
        )?;

        Ok((files, children))
    }

    /// Follows parent references from `start_id`. The number of hops is
    /// capped by the owner's folder count and every id may be seen once;
    /// breaking either rule means the stored forest already has a cycle.
    async fn walk_up(
        &self,
        start_id: &str,
        owner_id: &str,
        stop_at: Option<&str>,
    ) -> Result<AncestorWalk, TreeError> {
        let cap = self.folder_repository.count_folders(owner_id).await? + 1;

        let mut visited: HashSet<String> = HashSet::new();
        let mut chain: Vec<Folder> = Vec::new();
        let mut current = Some(start_id.to_string());
        let mut hops: u64 = 0;

        while let Some(id) = current {
            if stop_at == Some(id.as_str()) {
                return Ok(AncestorWalk::Stopped);
            }

            hops += 1;
            if hops > cap || !visited.insert(id.clone()) {
                error!("Parent chain of folder {} loops or exceeds {} hops", start_id, cap);
                return Err(TreeError::CorruptHierarchy {
                    owner_id: owner_id.to_string(),
                    detail: format!("parent chain starting at {} revisits {}", start_id, id),
                });
            }

            match self.folder_repository.get_folder(&id, owner_id).await? {
                Some(folder) => {
                    current = folder.parent_id().map(str::to_string);
                    chain.push(folder);
                }
                None => return Ok(AncestorWalk::Broken(chain)),
            }
        }

        Ok(AncestorWalk::Reached(chain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingListings, TestTree};

    #[tokio::test]
    async fn test_move_to_itself_is_rejected() {
        let tree = TestTree::new();
        let a = tree.folder("A", None).await;

        let check = tree.validator().can_move(&a, Some(&a), TestTree::OWNER).await.unwrap();
        assert_eq!(check, MoveCheck::Rejected(MoveRejection::SelfMove));
    }

    #[tokio::test]
    async fn test_move_under_descendant_is_rejected() {
        let tree = TestTree::new();
        let a = tree.folder("A", None).await;
        let b = tree.folder("B", Some(&a)).await;
        let c = tree.folder("C", Some(&b)).await;

        let validator = tree.validator();
        for target in [&b, &c] {
            let check = validator.can_move(&a, Some(target), TestTree::OWNER).await.unwrap();
            assert_eq!(check, MoveCheck::Rejected(MoveRejection::CyclicMove));
        }
    }

    #[tokio::test]
    async fn test_move_to_root_skips_the_walk() {
        let tree = TestTree::new();
        let a = tree.folder("A", None).await;

        // Even with every lookup failing the root move is allowed
        let validator = tree.validator_with_failures(FailingListings::everything());
        let check = validator.can_move(&a, None, TestTree::OWNER).await.unwrap();
        assert_eq!(check, MoveCheck::Allowed);
    }

    #[tokio::test]
    async fn test_move_into_sibling_subtree_is_allowed() {
        let tree = TestTree::new();
        let a = tree.folder("A", None).await;
        let b = tree.folder("B", None).await;
        let b1 = tree.folder("B1", Some(&b)).await;

        let check = tree.validator().can_move(&a, Some(&b1), TestTree::OWNER).await.unwrap();
        assert_eq!(check, MoveCheck::Allowed);
    }

    #[tokio::test]
    async fn test_target_of_another_owner_is_not_found() {
        let tree = TestTree::new();
        let a = tree.folder("A", None).await;
        let foreign = tree.folder_for("intruder", "X", None).await;

        let check = tree.validator().can_move(&a, Some(&foreign), TestTree::OWNER).await.unwrap();
        assert_eq!(check, MoveCheck::Rejected(MoveRejection::NotFound));
    }

    #[tokio::test]
    async fn test_corrupt_cycle_is_an_internal_error() {
        let tree = TestTree::new();
        let x = tree.folder("X", None).await;
        let y = tree.folder("Y", Some(&x)).await;
        let moving = tree.folder("M", None).await;
        // Bypass every guard: X <-> Y
        tree.force_parent(&x, Some(&y));

        let result = tree.validator().can_move(&moving, Some(&x), TestTree::OWNER).await;
        assert!(matches!(result, Err(TreeError::CorruptHierarchy { .. })));
    }

    #[tokio::test]
    async fn test_collect_paths_deduplicates_overlapping_roots() {
        let tree = TestTree::new();
        let a = tree.folder("A", None).await;
        let b = tree.folder("B", Some(&a)).await;
        let x = tree.file("x.txt", Some(&b)).await;
        let y = tree.file("y.txt", Some(&a)).await;
        tree.file("outside.txt", None).await;

        let paths = tree
            .validator()
            .collect_descendant_paths(&[a.clone(), b.clone()], TestTree::OWNER)
            .await
            .unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(paths.iter().filter(|p| **p == tree.path_of(&x)).count(), 1);
        assert!(paths.contains(&tree.path_of(&y)));
    }

    #[tokio::test]
    async fn test_collect_subtree_orders_parents_first_and_includes_trash() {
        let tree = TestTree::new();
        let a = tree.folder("A", None).await;
        let b = tree.folder("B", Some(&a)).await;
        let c = tree.folder("C", Some(&b)).await;
        let trashed = tree.file("old.bin", Some(&c)).await;
        tree.trash_file(&trashed).await;

        let contents = tree.validator().collect_subtree(&[a.clone()], TestTree::OWNER).await.unwrap();

        assert_eq!(contents.folder_ids, vec![a, b, c]);
        assert_eq!(contents.file_ids, vec![trashed.clone()]);
        assert_eq!(contents.storage_paths, vec![tree.path_of(&trashed)]);
    }

    #[tokio::test]
    async fn test_collect_subtree_aborts_on_listing_failure() {
        let tree = TestTree::new();
        let a = tree.folder("A", None).await;
        let b = tree.folder("B", Some(&a)).await;
        tree.file("x.txt", Some(&b)).await;

        let validator = tree.validator_with_failures(FailingListings::for_folder(&b));
        let result = validator.collect_subtree(&[a], TestTree::OWNER).await;

        assert!(matches!(result, Err(TreeError::Store(_))));
    }

    #[tokio::test]
    async fn test_ancestor_chain_walks_to_root() {
        let tree = TestTree::new();
        let a = tree.folder("A", None).await;
        let b = tree.folder("B", Some(&a)).await;
        let c = tree.folder("C", Some(&b)).await;

        let chain = tree.validator().ancestor_chain(&c, TestTree::OWNER).await.unwrap();
        let ids: Vec<&str> = chain.iter().map(|f| f.id()).collect();
        assert_eq!(ids, vec![c.as_str(), b.as_str(), a.as_str()]);

        let missing = tree.validator().ancestor_chain("nope", TestTree::OWNER).await.unwrap();
        assert!(missing.is_empty());
    }
}
