//! One notification pass.
//!
//! Fetches everything added since the watermark, formats movies and shows
//! into embeds, delivers them and reports the new watermark. Persisting the
//! watermark is left to the caller so it only happens after delivery
//! succeeded.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, TautulliError};
use crate::format::{aggregate_tv, format_movie, format_show};
use crate::notify::discord::Attachment;
use crate::notify::{build_messages, NotificationSink, OutgoingMessage, PreparedEmbed};
use crate::services::tautulli::{MediaType, RecentlyAddedItem};
use crate::services::MediaSource;
use crate::watermark::Watermark;

/// Upper bound on pages fetched in one pass.
pub const DEFAULT_MAX_PAGES: u32 = 100;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub watermark: Option<DateTime<Utc>>,
    pub lookback: Duration,
    pub page_size: u32,
    pub max_pages: u32,
    pub library_names: Vec<String>,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            watermark: config.last_run_timestamp,
            lookback: Duration::hours(i64::from(config.lookback_hours)),
            page_size: config.page_size,
            max_pages: DEFAULT_MAX_PAGES,
            library_names: config.library_names.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Watermark the pass started from.
    pub previous: DateTime<Utc>,
    /// Watermark after the pass.
    pub watermark: DateTime<Utc>,
    pub movies: usize,
    pub shows: usize,
    pub messages: usize,
}

impl RunReport {
    fn empty(watermark: DateTime<Utc>) -> Self {
        Self {
            previous: watermark,
            watermark,
            movies: 0,
            shows: 0,
            messages: 0,
        }
    }

    pub fn advanced(&self) -> bool {
        self.watermark > self.previous
    }
}

/// Run one pass against `source`, delivering to `sink`.
pub async fn run_once(
    source: &(dyn MediaSource + Send + Sync),
    sink: &(dyn NotificationSink + Send + Sync),
    settings: &RunSettings,
    now: DateTime<Utc>,
) -> Result<RunReport, AppError> {
    let mut watermark = Watermark::resolve(settings.watermark, now, settings.lookback);
    let previous = watermark.at();
    info!("Checking {} for items added after {}", source.source_name(), previous.to_rfc3339());

    let sections = resolve_sections(source, &settings.library_names).await?;
    if matches!(&sections, Some(ids) if ids.is_empty()) {
        warn!("None of the configured libraries exist; nothing to report");
        return Ok(RunReport::empty(previous));
    }

    let mut items = fetch_new_items(source, &watermark, settings.page_size, settings.max_pages).await?;
    if let Some(ids) = &sections {
        items.retain(|item| item.section_id.map_or(false, |id| ids.contains(&id)));
    }

    let movies: Vec<&RecentlyAddedItem> = items
        .iter()
        .filter(|item| item.media_type == MediaType::Movie)
        .collect();
    let shows = aggregate_tv(&items);

    let skipped = items
        .iter()
        .filter(|item| matches!(item.media_type, MediaType::Other(_)))
        .count();
    if skipped > 0 {
        debug!("Skipping {} items that are neither movies nor TV", skipped);
    }

    if movies.is_empty() && shows.is_empty() {
        info!("Nothing new since {}", previous.to_rfc3339());
        return Ok(RunReport::empty(previous));
    }

    let server = source.server_name().await?;
    info!("{} new movies and {} shows with new content", movies.len(), shows.len());

    let mut movie_embeds = Vec::with_capacity(movies.len());
    for (index, movie) in movies.iter().enumerate() {
        let attachment = fetch_poster(source, movie.thumb.as_deref(), &format!("movie-{}", index)).await;
        movie_embeds.push(PreparedEmbed {
            embed: format_movie(movie, attachment.as_ref().map(Attachment::reference)),
            attachment,
        });
    }

    let mut show_embeds = Vec::with_capacity(shows.len());
    for (index, show) in shows.iter().enumerate() {
        let attachment = fetch_poster(source, show.poster.as_deref(), &format!("show-{}", index)).await;
        show_embeds.push(PreparedEmbed {
            embed: format_show(show, attachment.as_ref().map(Attachment::reference)),
            attachment,
        });
    }

    let mut outgoing = build_messages(&format!("**New Movies on {}**", server), movie_embeds);
    outgoing.extend(build_messages(&format!("**New TV on {}**", server), show_embeds));

    deliver_all(sink, &outgoing).await?;

    let reported = items
        .iter()
        .filter(|item| item.media_type == MediaType::Movie || item.media_type.is_tv());
    for item in reported {
        if let Some(added_at) = item.added_at_utc() {
            watermark.advance(added_at);
        }
    }

    Ok(RunReport {
        previous,
        watermark: watermark.at(),
        movies: movies.len(),
        shows: shows.len(),
        messages: outgoing.len(),
    })
}

async fn deliver_all(
    sink: &(dyn NotificationSink + Send + Sync),
    outgoing: &[OutgoingMessage],
) -> Result<(), AppError> {
    for (index, message) in outgoing.iter().enumerate() {
        sink.deliver(&message.message, &message.attachments).await?;
        info!(
            "Delivered message {}/{} ({} embeds)",
            index + 1,
            outgoing.len(),
            message.message.embeds.len()
        );
    }
    Ok(())
}

/// Section ids allowed by the library filter. `None` allows every library.
async fn resolve_sections(
    source: &(dyn MediaSource + Send + Sync),
    names: &[String],
) -> Result<Option<HashSet<u64>>, TautulliError> {
    if names.is_empty() {
        return Ok(None);
    }

    let libraries = source.libraries().await?;
    let mut sections = HashSet::new();
    for name in names {
        match libraries
            .iter()
            .find(|library| library.section_name.eq_ignore_ascii_case(name.trim()))
        {
            Some(library) => {
                sections.insert(library.section_id);
            }
            None => warn!("Library '{}' not found on {}", name, source.source_name()),
        }
    }

    Ok(Some(sections))
}

/// Page through recently added items until the watermark is reached.
///
/// Tautulli returns items newest first, so the first page that contains an
/// already reported item, or comes back short, is the last one needed.
/// Pages are offset based; items added mid-pass shift later pages, so rows
/// already collected are dropped.
async fn fetch_new_items(
    source: &(dyn MediaSource + Send + Sync),
    watermark: &Watermark,
    page_size: u32,
    max_pages: u32,
) -> Result<Vec<RecentlyAddedItem>, TautulliError> {
    let mut fresh = Vec::new();
    let mut seen = HashSet::new();
    let mut start = 0;

    for _ in 0..max_pages {
        let page = source.recently_added(page_size, start).await?;
        let full_page = page.len() >= page_size as usize;

        let mut reached_watermark = false;
        for item in page {
            if watermark.admits_item(&item) {
                if seen.insert(item_identity(&item)) {
                    fresh.push(item);
                } else {
                    debug!("Dropping repeated item {:?}", item.title);
                }
            } else {
                reached_watermark = true;
            }
        }

        if reached_watermark || !full_page {
            return Ok(fresh);
        }
        start += page_size;
    }

    warn!("Stopped paging after {} pages; older items were not checked", max_pages);
    Ok(fresh)
}

/// Rating key, or media type, `added_at` and title when the key is missing.
fn item_identity(item: &RecentlyAddedItem) -> String {
    match &item.rating_key {
        Some(key) => format!("key:{}", key),
        None => format!(
            "{:?}:{}:{}",
            item.media_type,
            item.added_at,
            item.title.as_deref().unwrap_or_default()
        ),
    }
}

/// Download a poster as an attachment named `{name}.{ext}`.
///
/// A missing or broken poster only drops the image from the embed.
async fn fetch_poster(
    source: &(dyn MediaSource + Send + Sync),
    thumb: Option<&str>,
    name: &str,
) -> Option<Attachment> {
    let thumb = thumb?;
    match source.poster(thumb).await {
        Ok(image) => {
            let extension = image.extension();
            Some(Attachment {
                filename: format!("{}.{}", name, extension),
                mime: image.mime,
                data: image.bytes,
            })
        }
        Err(err) => {
            warn!("Poster for {} unavailable: {}", name, err);
            None
        }
    }
}
