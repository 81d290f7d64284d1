//! Media source interface
//!
//! Abstraction over the monitoring API so the run pipeline can be driven by
//! the real Tautulli client or by an in-memory fake in tests.

use async_trait::async_trait;

use crate::error::TautulliError;
use crate::services::tautulli::{Library, PosterImage, RecentlyAddedItem, TautulliClient};

#[async_trait]
pub trait MediaSource {
    /// Newest-first page of recently added items across all libraries.
    async fn recently_added(
        &self,
        count: u32,
        start: u32,
    ) -> Result<Vec<RecentlyAddedItem>, TautulliError>;

    async fn libraries(&self) -> Result<Vec<Library>, TautulliError>;

    /// Friendly name used in the message header.
    async fn server_name(&self) -> Result<String, TautulliError>;

    async fn poster(&self, thumb: &str) -> Result<PosterImage, TautulliError>;

    fn source_name(&self) -> &str;
}

#[async_trait]
impl MediaSource for TautulliClient {
    async fn recently_added(
        &self,
        count: u32,
        start: u32,
    ) -> Result<Vec<RecentlyAddedItem>, TautulliError> {
        self.get_recently_added(count, start, None).await
    }

    async fn libraries(&self) -> Result<Vec<Library>, TautulliError> {
        self.get_libraries().await
    }

    async fn server_name(&self) -> Result<String, TautulliError> {
        self.get_server_friendly_name().await
    }

    async fn poster(&self, thumb: &str) -> Result<PosterImage, TautulliError> {
        self.fetch_image(thumb).await
    }

    fn source_name(&self) -> &str {
        self.base_url()
    }
}
