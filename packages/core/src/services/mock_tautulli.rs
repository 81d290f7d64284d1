//! In-memory stand-in for Tautulli used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::TautulliError;
use crate::services::provider::MediaSource;
use crate::services::tautulli::{Library, PosterImage, RecentlyAddedItem};

#[derive(Default)]
pub struct MockTautulli {
    items: Vec<RecentlyAddedItem>,
    libraries: Vec<Library>,
    posters: HashMap<String, PosterImage>,
    error: Option<String>,
    pages: Mutex<Vec<(u32, u32)>>,
}

impl MockTautulli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items are served newest first, like the real API.
    pub fn with_items(mut self, mut items: Vec<RecentlyAddedItem>) -> Self {
        items.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        self.items = items;
        self
    }

    pub fn with_library(mut self, section_id: u64, name: &str) -> Self {
        self.libraries.push(Library {
            section_id,
            section_name: name.to_string(),
            section_type: String::new(),
        });
        self
    }

    pub fn with_poster(mut self, thumb: &str) -> Self {
        self.posters.insert(
            thumb.to_string(),
            PosterImage {
                bytes: thumb.as_bytes().to_vec(),
                mime: "image/jpeg".to_string(),
            },
        );
        self
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    /// `(count, start)` of every page requested so far.
    pub fn pages_requested(&self) -> Vec<(u32, u32)> {
        self.pages.lock().unwrap().clone()
    }

    fn fail(&self, cmd: &str) -> Result<(), TautulliError> {
        match &self.error {
            Some(message) => Err(TautulliError::api(cmd, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MediaSource for MockTautulli {
    async fn recently_added(
        &self,
        count: u32,
        start: u32,
    ) -> Result<Vec<RecentlyAddedItem>, TautulliError> {
        self.fail("get_recently_added")?;
        self.pages.lock().unwrap().push((count, start));
        Ok(self
            .items
            .iter()
            .skip(start as usize)
            .take(count as usize)
            .cloned()
            .collect())
    }

    async fn libraries(&self) -> Result<Vec<Library>, TautulliError> {
        self.fail("get_libraries")?;
        Ok(self.libraries.clone())
    }

    async fn server_name(&self) -> Result<String, TautulliError> {
        self.fail("get_server_friendly_name")?;
        Ok("Test Plex".to_string())
    }

    async fn poster(&self, thumb: &str) -> Result<PosterImage, TautulliError> {
        self.posters
            .get(thumb)
            .cloned()
            .ok_or(TautulliError::Status { status: 404 })
    }

    fn source_name(&self) -> &str {
        "mock"
    }
}
