//! In-memory fakes behind the domain traits, shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::stream;

use crate::common::config::AppConfig;
use crate::common::di::{AppServiceFactory, AppState, RepositoryServices};
use crate::common::errors::Result;
use crate::domain::entities::file::File;
use crate::domain::entities::folder::Folder;
use crate::domain::entities::share::SharedLink;
use crate::domain::entities::user_preferences::UserPreferences;
use crate::domain::repositories::blob_repository::{
    BlobRemoval, BlobRepository, BlobRepositoryError, BlobRepositoryResult, BlobStream,
};
use crate::domain::repositories::file_repository::{FileRepository, FileRepositoryError, FileRepositoryResult};
use crate::domain::repositories::folder_repository::{
    FolderRepository, FolderRepositoryError, FolderRepositoryResult, ListScope,
};
use crate::domain::repositories::preferences_repository::PreferencesRepository;
use crate::domain::repositories::share_repository::ShareRepository;
use crate::domain::services::auth_service::TokenClaims;
use crate::domain::services::tree_validator::TreeValidator;

/// Which store calls should fail
#[derive(Debug, Default, Clone)]
pub struct FailingListings {
    folders: HashSet<String>,
    everything: bool,
}

impl FailingListings {
    pub fn everything() -> Self {
        Self { folders: HashSet::new(), everything: true }
    }

    pub fn for_folder(folder_id: &str) -> Self {
        Self { folders: HashSet::from([folder_id.to_string()]), everything: false }
    }

    fn lookups_fail(&self) -> bool {
        self.everything
    }

    fn listing_fails(&self, folder_id: Option<&str>) -> bool {
        self.everything || folder_id.is_some_and(|id| self.folders.contains(id))
    }
}

fn sorted_by_name<T, F: Fn(&T) -> String>(mut items: Vec<T>, key: F) -> Vec<T> {
    items.sort_by_key(|item| key(item).to_lowercase());
    items
}

pub struct MemoryFolderRepository {
    folders: Mutex<HashMap<String, Folder>>,
    failures: Mutex<FailingListings>,
}

impl MemoryFolderRepository {
    pub fn new() -> Self {
        Self {
            folders: Mutex::new(HashMap::new()),
            failures: Mutex::new(FailingListings::default()),
        }
    }

    pub fn fail_with(&self, failures: FailingListings) {
        *self.failures.lock().unwrap() = failures;
    }

    pub fn snapshot(&self, id: &str) -> Option<Folder> {
        self.folders.lock().unwrap().get(id).cloned()
    }

    /// Rewrites a parent reference with no validation at all
    pub fn force_parent(&self, id: &str, parent_id: Option<&str>) {
        let mut folders = self.folders.lock().unwrap();
        if let Some(folder) = folders.get(id).cloned() {
            folders.insert(id.to_string(), folder.with_parent(parent_id.map(str::to_string)));
        }
    }

    fn check_lookup(&self) -> FolderRepositoryResult<()> {
        if self.failures.lock().unwrap().lookups_fail() {
            return Err(FolderRepositoryError::Store("injected lookup failure".to_string()));
        }
        Ok(())
    }

    fn owned(&self, id: &str, owner_id: &str) -> Option<Folder> {
        self.folders
            .lock()
            .unwrap()
            .get(id)
            .filter(|folder| folder.is_owned_by(owner_id))
            .cloned()
    }

    fn replace(&self, folder: Folder) -> Folder {
        self.folders.lock().unwrap().insert(folder.id().to_string(), folder.clone());
        folder
    }
}

#[async_trait]
impl FolderRepository for MemoryFolderRepository {
    async fn create_folder(&self, folder: &Folder) -> FolderRepositoryResult<Folder> {
        let mut folders = self.folders.lock().unwrap();
        if folders.contains_key(folder.id()) {
            return Err(FolderRepositoryError::AlreadyExists(folder.id().to_string()));
        }
        folders.insert(folder.id().to_string(), folder.clone());
        Ok(folder.clone())
    }

    async fn get_folder(&self, id: &str, owner_id: &str) -> FolderRepositoryResult<Option<Folder>> {
        self.check_lookup()?;
        Ok(self.owned(id, owner_id))
    }

    async fn list_children(
        &self,
        parent_id: Option<&str>,
        owner_id: &str,
        scope: ListScope,
    ) -> FolderRepositoryResult<Vec<Folder>> {
        if self.failures.lock().unwrap().listing_fails(parent_id) {
            return Err(FolderRepositoryError::Store("injected listing failure".to_string()));
        }
        let children = self
            .folders
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.is_owned_by(owner_id) && f.parent_id() == parent_id)
            .filter(|f| scope == ListScope::All || !f.is_trashed())
            .cloned()
            .collect();
        Ok(sorted_by_name(children, |f: &Folder| f.name().to_string()))
    }

    async fn list_trashed(&self, owner_id: &str) -> FolderRepositoryResult<Vec<Folder>> {
        let mut trashed: Vec<Folder> = self
            .folders
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.is_owned_by(owner_id) && f.is_trashed())
            .cloned()
            .collect();
        trashed.sort_by_key(|f| std::cmp::Reverse(f.trashed_at()));
        Ok(trashed)
    }

    async fn list_favorites(&self, owner_id: &str) -> FolderRepositoryResult<Vec<Folder>> {
        let favorites = self
            .folders
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.is_owned_by(owner_id) && f.is_favorite() && !f.is_trashed())
            .cloned()
            .collect();
        Ok(sorted_by_name(favorites, |f: &Folder| f.name().to_string()))
    }

    async fn count_folders(&self, owner_id: &str) -> FolderRepositoryResult<u64> {
        self.check_lookup()?;
        Ok(self
            .folders
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.is_owned_by(owner_id))
            .count() as u64)
    }

    async fn update_parent(
        &self,
        id: &str,
        new_parent_id: Option<&str>,
        owner_id: &str,
    ) -> FolderRepositoryResult<()> {
        let folder = self
            .owned(id, owner_id)
            .ok_or_else(|| FolderRepositoryError::NotFound(id.to_string()))?;

        // Same guard as the SQL adapter: the new parent may not descend from `id`
        let mut seen = HashSet::new();
        let mut current = new_parent_id.map(str::to_string);
        while let Some(ancestor) = current {
            if ancestor == id {
                return Err(FolderRepositoryError::WouldCycle(id.to_string()));
            }
            if !seen.insert(ancestor.clone()) {
                break;
            }
            current = self.owned(&ancestor, owner_id).and_then(|f| f.parent_id().map(str::to_string));
        }

        self.replace(folder.with_parent(new_parent_id.map(str::to_string)));
        Ok(())
    }

    async fn rename_folder(&self, id: &str, new_name: &str, owner_id: &str) -> FolderRepositoryResult<Folder> {
        let folder = self
            .owned(id, owner_id)
            .ok_or_else(|| FolderRepositoryError::NotFound(id.to_string()))?;
        let renamed = folder
            .with_name(new_name.to_string())
            .map_err(|e| FolderRepositoryError::Store(e.to_string()))?;
        Ok(self.replace(renamed))
    }

    async fn set_favorite(&self, id: &str, is_favorite: bool, owner_id: &str) -> FolderRepositoryResult<()> {
        let folder = self
            .owned(id, owner_id)
            .ok_or_else(|| FolderRepositoryError::NotFound(id.to_string()))?;
        self.replace(folder.with_favorite(is_favorite));
        Ok(())
    }

    async fn set_trashed(
        &self,
        ids: &[String],
        trashed: bool,
        owner_id: &str,
    ) -> FolderRepositoryResult<Vec<String>> {
        let mut updated = Vec::new();
        for id in ids {
            if let Some(folder) = self.owned(id, owner_id) {
                self.replace(if trashed { folder.trashed() } else { folder.restored() });
                updated.push(id.clone());
            }
        }
        Ok(updated)
    }

    async fn delete_folders(&self, ids: &[String], owner_id: &str) -> FolderRepositoryResult<Vec<String>> {
        let mut folders = self.folders.lock().unwrap();
        let mut removed = Vec::new();
        for id in ids {
            if folders.get(id).is_some_and(|f| f.is_owned_by(owner_id)) {
                folders.remove(id);
                removed.push(id.clone());
            }
        }
        Ok(removed)
    }
}

pub struct MemoryFileRepository {
    files: Mutex<HashMap<String, File>>,
    failures: Mutex<FailingListings>,
    fail_inserts: Mutex<bool>,
}

impl MemoryFileRepository {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            failures: Mutex::new(FailingListings::default()),
            fail_inserts: Mutex::new(false),
        }
    }

    pub fn fail_with(&self, failures: FailingListings) {
        *self.failures.lock().unwrap() = failures;
    }

    pub fn fail_inserts(&self) {
        *self.fail_inserts.lock().unwrap() = true;
    }

    pub fn snapshot(&self, id: &str) -> Option<File> {
        self.files.lock().unwrap().get(id).cloned()
    }

    fn owned(&self, id: &str, owner_id: &str) -> Option<File> {
        self.files
            .lock()
            .unwrap()
            .get(id)
            .filter(|file| file.user_id() == owner_id)
            .cloned()
    }

    fn replace(&self, file: File) -> File {
        self.files.lock().unwrap().insert(file.id().to_string(), file.clone());
        file
    }

    fn select<P: Fn(&File) -> bool>(&self, owner_id: &str, predicate: P) -> Vec<File> {
        self.files
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.user_id() == owner_id && predicate(f))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl FileRepository for MemoryFileRepository {
    async fn create_file(&self, file: &File) -> FileRepositoryResult<File> {
        if *self.fail_inserts.lock().unwrap() {
            return Err(FileRepositoryError::Store("injected insert failure".to_string()));
        }
        let mut files = self.files.lock().unwrap();
        if files.values().any(|f| f.storage_path() == file.storage_path()) {
            return Err(FileRepositoryError::AlreadyExists(file.storage_path().to_string()));
        }
        files.insert(file.id().to_string(), file.clone());
        Ok(file.clone())
    }

    async fn get_file(&self, id: &str, owner_id: &str) -> FileRepositoryResult<Option<File>> {
        Ok(self.owned(id, owner_id))
    }

    async fn get_files(&self, ids: &[String], owner_id: &str) -> FileRepositoryResult<Vec<File>> {
        Ok(ids.iter().filter_map(|id| self.owned(id, owner_id)).collect())
    }

    async fn list_files(
        &self,
        folder_id: Option<&str>,
        owner_id: &str,
        scope: ListScope,
    ) -> FileRepositoryResult<Vec<File>> {
        if self.failures.lock().unwrap().listing_fails(folder_id) {
            return Err(FileRepositoryError::Store("injected listing failure".to_string()));
        }
        let files = self.select(owner_id, |f| {
            f.folder_id() == folder_id && (scope == ListScope::All || !f.is_trashed())
        });
        Ok(sorted_by_name(files, |f: &File| f.name().to_string()))
    }

    async fn list_trashed(&self, owner_id: &str) -> FileRepositoryResult<Vec<File>> {
        let mut trashed = self.select(owner_id, |f| f.is_trashed());
        trashed.sort_by_key(|f| std::cmp::Reverse(f.trashed_at()));
        Ok(trashed)
    }

    async fn list_favorites(&self, owner_id: &str) -> FileRepositoryResult<Vec<File>> {
        let favorites = self.select(owner_id, |f| f.is_favorite() && !f.is_trashed());
        Ok(sorted_by_name(favorites, |f: &File| f.name().to_string()))
    }

    async fn move_files(
        &self,
        ids: &[String],
        target_folder_id: Option<&str>,
        owner_id: &str,
    ) -> FileRepositoryResult<Vec<String>> {
        let mut moved = Vec::new();
        for id in ids {
            if let Some(file) = self.owned(id, owner_id) {
                self.replace(file.with_folder(target_folder_id.map(str::to_string)));
                moved.push(id.clone());
            }
        }
        Ok(moved)
    }

    async fn rename_file(&self, id: &str, new_name: &str, owner_id: &str) -> FileRepositoryResult<File> {
        let file = self
            .owned(id, owner_id)
            .ok_or_else(|| FileRepositoryError::NotFound(id.to_string()))?;
        let renamed = file
            .with_name(new_name.to_string())
            .map_err(|e| FileRepositoryError::Store(e.to_string()))?;
        Ok(self.replace(renamed))
    }

    async fn set_favorite(&self, id: &str, is_favorite: bool, owner_id: &str) -> FileRepositoryResult<()> {
        let file = self
            .owned(id, owner_id)
            .ok_or_else(|| FileRepositoryError::NotFound(id.to_string()))?;
        self.replace(file.with_favorite(is_favorite));
        Ok(())
    }

    async fn set_trashed(
        &self,
        ids: &[String],
        trashed: bool,
        owner_id: &str,
    ) -> FileRepositoryResult<Vec<String>> {
        let mut updated = Vec::new();
        for id in ids {
            if let Some(file) = self.owned(id, owner_id) {
                self.replace(if trashed { file.trashed() } else { file.restored() });
                updated.push(id.clone());
            }
        }
        Ok(updated)
    }

    async fn delete_files(&self, ids: &[String], owner_id: &str) -> FileRepositoryResult<Vec<String>> {
        let mut files = self.files.lock().unwrap();
        let mut removed = Vec::new();
        for id in ids {
            if files.get(id).is_some_and(|f| f.user_id() == owner_id) {
                files.remove(id);
                removed.push(id.clone());
            }
        }
        Ok(removed)
    }

    async fn total_size(&self, owner_id: &str) -> FileRepositoryResult<u64> {
        Ok(self.select(owner_id, |f| !f.is_trashed()).iter().map(File::size).sum())
    }
}

pub struct MemoryBlobRepository {
    blobs: Mutex<HashMap<String, Bytes>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryBlobRepository {
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_removal_of(&self, path: &str) {
        self.failing.lock().unwrap().insert(path.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobRepository for MemoryBlobRepository {
    async fn put(&self, path: &str, content: Bytes) -> BlobRepositoryResult<()> {
        let mut blobs = self.blobs.lock().unwrap();
        if blobs.contains_key(path) {
            return Err(BlobRepositoryError::AlreadyExists(path.to_string()));
        }
        blobs.insert(path.to_string(), content);
        Ok(())
    }

    async fn open(&self, path: &str) -> BlobRepositoryResult<BlobStream> {
        let content = self
            .blobs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| BlobRepositoryError::NotFound(path.to_string()))?;
        Ok(Box::pin(stream::once(async move { Ok(content) })))
    }

    async fn remove(&self, paths: &[String]) -> BlobRemoval {
        let failing = self.failing.lock().unwrap().clone();
        let mut blobs = self.blobs.lock().unwrap();
        let mut outcome = BlobRemoval::default();
        for path in paths {
            if failing.contains(path) {
                outcome.failed.push((path.clone(), "injected removal failure".to_string()));
            } else {
                blobs.remove(path);
                outcome.removed.push(path.clone());
            }
        }
        outcome
    }
}

pub struct MemoryShareRepository {
    links: Mutex<HashMap<String, SharedLink>>,
    files: Arc<MemoryFileRepository>,
}

impl MemoryShareRepository {
    pub fn new(files: Arc<MemoryFileRepository>) -> Self {
        Self { links: Mutex::new(HashMap::new()), files }
    }

    /// Stores a link as-is, expired or not
    pub fn insert(&self, link: SharedLink) {
        self.links.lock().unwrap().insert(link.id.clone(), link);
    }

    fn file_owned_by(&self, file_id: &str, owner_id: &str) -> bool {
        self.files.snapshot(file_id).is_some_and(|f| f.user_id() == owner_id)
    }
}

#[async_trait]
impl ShareRepository for MemoryShareRepository {
    async fn create_link(&self, link: &SharedLink) -> Result<SharedLink> {
        self.insert(link.clone());
        Ok(link.clone())
    }

    async fn find_by_file(&self, file_id: &str, owner_id: &str) -> Result<Option<SharedLink>> {
        if !self.file_owned_by(file_id, owner_id) {
            return Ok(None);
        }
        Ok(self
            .links
            .lock()
            .unwrap()
            .values()
            .filter(|link| link.file_id == file_id)
            .max_by_key(|link| link.created_at)
            .cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<(SharedLink, File)>> {
        let link = self.links.lock().unwrap().values().find(|l| l.token == token).cloned();
        Ok(link.and_then(|link| self.files.snapshot(&link.file_id).map(|file| (link, file))))
    }

    async fn delete_link(&self, id: &str, owner_id: &str) -> Result<bool> {
        let file_id = match self.links.lock().unwrap().get(id) {
            Some(link) => link.file_id.clone(),
            None => return Ok(false),
        };
        if !self.file_owned_by(&file_id, owner_id) {
            return Ok(false);
        }
        Ok(self.links.lock().unwrap().remove(id).is_some())
    }

    async fn increment_download_count(&self, id: &str) -> Result<()> {
        if let Some(link) = self.links.lock().unwrap().get_mut(id) {
            link.download_count += 1;
        }
        Ok(())
    }
}

pub struct MemoryPreferencesRepository {
    preferences: Mutex<HashMap<String, UserPreferences>>,
}

impl MemoryPreferencesRepository {
    pub fn new() -> Self {
        Self { preferences: Mutex::new(HashMap::new()) }
    }
}

#[async_trait]
impl PreferencesRepository for MemoryPreferencesRepository {
    async fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        Ok(self.preferences.lock().unwrap().get(user_id).cloned())
    }

    async fn upsert_preferences(&self, preferences: &UserPreferences) -> Result<UserPreferences> {
        let mut stored = preferences.clone();
        stored.updated_at = Utc::now();
        self.preferences
            .lock()
            .unwrap()
            .insert(stored.user_id.clone(), stored.clone());
        Ok(stored)
    }
}

/// A populated folder forest plus blob store for one owner
pub struct TestTree {
    pub folders: Arc<MemoryFolderRepository>,
    pub files: Arc<MemoryFileRepository>,
    pub blobs: Arc<MemoryBlobRepository>,
}

impl TestTree {
    pub const OWNER: &'static str = "owner-1";

    pub fn new() -> Self {
        Self {
            folders: Arc::new(MemoryFolderRepository::new()),
            files: Arc::new(MemoryFileRepository::new()),
            blobs: Arc::new(MemoryBlobRepository::new()),
        }
    }

    pub async fn folder(&self, name: &str, parent: Option<&str>) -> String {
        self.folder_for(Self::OWNER, name, parent).await
    }

    pub async fn folder_for(&self, owner: &str, name: &str, parent: Option<&str>) -> String {
        let folder = Folder::new(name.to_string(), parent.map(str::to_string), owner.to_string()).unwrap();
        self.folders.create_folder(&folder).await.unwrap().id().to_string()
    }

    /// Creates a file record and its blob
    pub async fn file(&self, name: &str, folder: Option<&str>) -> String {
        self.sized_file(name, folder, name.len() as u64).await
    }

    pub async fn sized_file(&self, name: &str, folder: Option<&str>, size: u64) -> String {
        let path = format!("{}/{}-{}", Self::OWNER, uuid::Uuid::new_v4(), name);
        let file = File::new(
            name.to_string(),
            path.clone(),
            size,
            Some("text/plain".to_string()),
            folder.map(str::to_string),
            Self::OWNER.to_string(),
        )
        .unwrap();
        self.blobs.put(&path, Bytes::from(name.to_string())).await.unwrap();
        self.files.create_file(&file).await.unwrap().id().to_string()
    }

    pub async fn trash_file(&self, id: &str) {
        self.files.set_trashed(&[id.to_string()], true, Self::OWNER).await.unwrap();
    }

    pub fn path_of(&self, file_id: &str) -> String {
        self.files.snapshot(file_id).unwrap().storage_path().to_string()
    }

    pub fn force_parent(&self, id: &str, parent_id: Option<&str>) {
        self.folders.force_parent(id, parent_id);
    }

    pub fn validator(&self) -> TreeValidator {
        TreeValidator::new(self.folders.clone(), self.files.clone(), 4)
    }

    pub fn validator_with_failures(&self, failures: FailingListings) -> TreeValidator {
        self.folders.fail_with(failures.clone());
        self.files.fail_with(failures);
        self.validator()
    }
}

/// Secret the router tests sign their bearer tokens with
pub const TEST_SECRET: &str = "filevault-test-secret";

/// `Authorization` header value for `user_id`
pub fn bearer_for(user_id: &str) -> String {
    let claims = TokenClaims {
        sub: user_id.to_string(),
        exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
        iat: Some(Utc::now().timestamp()),
        email: None,
        role: None,
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

impl TestTree {
    /// Application state wired over the fakes
    pub fn app_state(&self) -> AppState {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = TEST_SECRET.to_string();
        config.auth.audience = None;

        let repositories = RepositoryServices {
            folder_repository: self.folders.clone(),
            file_repository: self.files.clone(),
            blob_repository: self.blobs.clone(),
            share_repository: Arc::new(MemoryShareRepository::new(self.files.clone())),
            preferences_repository: Arc::new(MemoryPreferencesRepository::new()),
        };

        let factory = AppServiceFactory::new(config.clone());
        let applications = factory.create_application_services(&repositories);
        AppState::new(config, applications, factory.create_auth_service())
    }
}
