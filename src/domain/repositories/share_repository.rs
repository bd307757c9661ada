use async_trait::async_trait;

use crate::common::errors::Result;
use crate::domain::entities::file::File;
use crate::domain::entities::share::SharedLink;

/// Share links carry no owner column; ownership is checked through the
/// linked file wherever an owner id is passed.
#[async_trait]
pub trait ShareRepository: Send + Sync + 'static {
    /// Save a new link
    async fn create_link(&self, link: &SharedLink) -> Result<SharedLink>;

    /// Most recent link of a file owned by `owner_id`
    async fn find_by_file(&self, file_id: &str, owner_id: &str) -> Result<Option<SharedLink>>;

    /// Public lookup: the link and the file it points to
    async fn find_by_token(&self, token: &str) -> Result<Option<(SharedLink, File)>>;

    /// Removes a link whose file belongs to `owner_id`; false if none matched
    async fn delete_link(&self, id: &str, owner_id: &str) -> Result<bool>;

    async fn increment_download_count(&self, id: &str) -> Result<()>;
}
