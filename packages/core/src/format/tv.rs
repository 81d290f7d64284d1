//! Roll-up of TV items into one summary per show.
//!
//! Tautulli reports whole shows, whole seasons and single episodes as
//! separate rows. A run usually sees a mix of them for the same show, so the
//! rows are grouped by show before anything is formatted.

use std::collections::{BTreeMap, HashMap};

use crate::format::movie::title_with_year;
use crate::format::ranges::format_ranges;
use crate::format::time::epoch_to_iso8601;
use crate::notify::discord::{colors, limits, Embed, EmbedField, EmbedFooter, EmbedImage};
use crate::notify::payload::truncate;
use crate::services::tautulli::{MediaType, RecentlyAddedItem};

/// What was added for one season.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonEntry {
    /// The season itself was added, not just some of its episodes.
    pub whole_season: bool,
    pub child_count: Option<u64>,
    /// Episode number to episode title.
    pub episodes: BTreeMap<u64, Option<String>>,
}

impl SeasonEntry {
    pub fn episode_count(&self) -> u64 {
        let listed = self.episodes.len() as u64;
        if self.whole_season {
            self.child_count.unwrap_or(0).max(listed)
        } else {
            listed
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShowSummary {
    pub key: String,
    pub title: String,
    pub year: Option<u64>,
    pub poster: Option<String>,
    /// Show summary, or a season summary when no show row was seen.
    /// Episode synopses never end up here.
    pub overview: Option<String>,
    pub latest_added_at: u64,
    pub library_name: Option<String>,
    pub whole_show: bool,
    pub season_count: Option<u64>,
    pub seasons: BTreeMap<u64, SeasonEntry>,
    /// Episodes that arrived without season or episode numbers.
    pub unindexed_episodes: u64,
    overview_rank: u8,
}

impl ShowSummary {
    fn new(key: String, title: String) -> Self {
        Self {
            key,
            title,
            year: None,
            poster: None,
            overview: None,
            latest_added_at: 0,
            library_name: None,
            whole_show: false,
            season_count: None,
            seasons: BTreeMap::new(),
            unindexed_episodes: 0,
            overview_rank: 0,
        }
    }

    pub fn total_episodes(&self) -> u64 {
        self.seasons.values().map(SeasonEntry::episode_count).sum::<u64>()
            + self.unindexed_episodes
    }

    fn absorb(&mut self, item: &RecentlyAddedItem) {
        self.latest_added_at = self.latest_added_at.max(item.added_at);
        if self.library_name.is_none() {
            self.library_name = item.library_name.clone();
        }

        let rank = match item.media_type {
            MediaType::Show => 2,
            MediaType::Season => 1,
            _ => 0,
        };
        if rank > self.overview_rank && item.summary.is_some() {
            self.overview = item.summary.clone();
            self.overview_rank = rank;
        }

        match item.media_type {
            MediaType::Show => {
                self.whole_show = true;
                self.season_count = item.child_count;
                self.year = item.year.or(self.year);
                if item.thumb.is_some() {
                    self.poster = item.thumb.clone();
                }
            }
            MediaType::Season => {
                if let Some(season) = item.media_index {
                    let entry = self.seasons.entry(season).or_default();
                    entry.whole_season = true;
                    entry.child_count = item.child_count.or(entry.child_count);
                }
                if self.poster.is_none() {
                    self.poster = item.parent_thumb.clone().or_else(|| item.thumb.clone());
                }
            }
            MediaType::Episode => {
                match (item.parent_media_index, item.media_index) {
                    (Some(season), Some(episode)) => {
                        self.seasons
                            .entry(season)
                            .or_default()
                            .episodes
                            .insert(episode, item.title.clone());
                    }
                    _ => self.unindexed_episodes += 1,
                }
                if self.poster.is_none() {
                    self.poster = item
                        .grandparent_thumb
                        .clone()
                        .or_else(|| item.parent_thumb.clone())
                        .or_else(|| item.thumb.clone());
                }
            }
            _ => {}
        }
    }
}

/// Show key and show title for a TV row.
fn show_identity(item: &RecentlyAddedItem) -> (Option<&String>, Option<&String>) {
    match item.media_type {
        MediaType::Show => (item.rating_key.as_ref(), item.title.as_ref()),
        MediaType::Season => (item.parent_rating_key.as_ref(), item.parent_title.as_ref()),
        _ => (
            item.grandparent_rating_key.as_ref(),
            item.grandparent_title.as_ref(),
        ),
    }
}

/// Group show, season and episode rows by show.
///
/// Shows keep the order in which they first appear in `items`. Rows that are
/// not TV content are ignored.
pub fn aggregate_tv<'a, I>(items: I) -> Vec<ShowSummary>
where
    I: IntoIterator<Item = &'a RecentlyAddedItem>,
{
    let mut shows: Vec<ShowSummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items.into_iter().filter(|item| item.media_type.is_tv()) {
        let (rating_key, title) = show_identity(item);
        let title = title.cloned().unwrap_or_else(|| "Unknown show".to_string());
        let key = match rating_key {
            Some(rating_key) => format!("key:{}", rating_key),
            None => format!("title:{}", title),
        };

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            shows.push(ShowSummary::new(key, title));
            shows.len() - 1
        });
        shows[slot].absorb(item);
    }

    shows
}

fn plural(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// One-line description of what was added for a show.
pub fn describe_show(show: &ShowSummary) -> String {
    if show.whole_show {
        return match show.season_count.filter(|n| *n > 0) {
            Some(n) => format!("New series, {}", plural(n, "season")),
            None => "New series".to_string(),
        };
    }

    if show.seasons.is_empty() {
        return show
            .overview
            .clone()
            .unwrap_or_else(|| "New episodes".to_string());
    }

    let mut seasons = show.seasons.iter();
    match (seasons.next(), seasons.next()) {
        (Some((season, entry)), None) => {
            if entry.whole_season || show.unindexed_episodes > 0 {
                match show.total_episodes() {
                    0 => format!("Season {}", season),
                    n => format!("Season {}, {}", season, plural(n, "episode")),
                }
            } else if entry.episodes.len() == 1 {
                let (episode, title) = entry
                    .episodes
                    .iter()
                    .next()
                    .map(|(episode, title)| (*episode, title.as_deref()))
                    .unwrap_or((0, None));
                match title {
                    Some(title) => format!("Season {} Episode {}: '{}'", season, episode, title),
                    None => format!("Season {} Episode {}", season, episode),
                }
            } else {
                format!(
                    "Season {}, Episodes {}",
                    season,
                    format_ranges(entry.episodes.keys().copied())
                )
            }
        }
        _ => {
            let ranges = format_ranges(show.seasons.keys().copied());
            match show.total_episodes() {
                0 => format!("Seasons {}", ranges),
                n => format!("Seasons {}, {}", ranges, plural(n, "episode")),
            }
        }
    }
}

/// Build the embed for one aggregated show.
pub fn format_show(show: &ShowSummary, image: Option<String>) -> Embed {
    let description = describe_show(show);

    let mut fields = Vec::new();
    if let Some(overview) = show.overview.as_deref() {
        if overview != description {
            fields.push(EmbedField::block(
                "Overview",
                truncate(overview, limits::FIELD_VALUE_CHARS),
            ));
        }
    }

    Embed {
        title: truncate(&title_with_year(&show.title, show.year), limits::TITLE_CHARS),
        description: Some(truncate(&description, limits::DESCRIPTION_CHARS)),
        fields,
        image: image.map(|url| EmbedImage { url }),
        timestamp: epoch_to_iso8601(show.latest_added_at),
        color: Some(colors::TV),
        footer: show
            .library_name
            .as_ref()
            .map(|library| EmbedFooter { text: library.clone() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn item(value: Value) -> RecentlyAddedItem {
        serde_json::from_value(value).unwrap()
    }

    fn episode(show_key: &str, show: &str, season: u64, ep: u64, title: &str, added: u64) -> RecentlyAddedItem {
        item(json!({
            "media_type": "episode",
            "added_at": added.to_string(),
            "library_name": "TV Shows",
            "title": title,
            "media_index": ep.to_string(),
            "parent_media_index": season.to_string(),
            "grandparent_rating_key": show_key,
            "grandparent_title": show,
            "grandparent_thumb": format!("/library/metadata/{}/thumb/1", show_key),
            "summary": format!("Episode {} summary", ep)
        }))
    }

    fn season(show_key: &str, show: &str, season: u64, children: u64) -> RecentlyAddedItem {
        item(json!({
            "media_type": "season",
            "added_at": "1700000100",
            "media_index": season,
            "child_count": children,
            "parent_rating_key": show_key,
            "parent_title": show,
            "parent_thumb": format!("/library/metadata/{}/thumb/2", show_key)
        }))
    }

    #[test]
    fn single_episode_names_the_episode() {
        let shows = aggregate_tv(&[episode("10", "Severance", 2, 3, "Who Is Alive?", 1700000000)]);

        assert_eq!(shows.len(), 1);
        assert_eq!(describe_show(&shows[0]), "Season 2 Episode 3: 'Who Is Alive?'");
        assert_eq!(shows[0].poster.as_deref(), Some("/library/metadata/10/thumb/1"));
    }

    #[test]
    fn several_episodes_of_one_season_collapse_into_ranges() {
        let items = vec![
            episode("10", "Severance", 2, 5, "e5", 1700000500),
            episode("10", "Severance", 2, 1, "e1", 1700000100),
            episode("10", "Severance", 2, 2, "e2", 1700000200),
            episode("10", "Severance", 2, 3, "e3", 1700000300),
        ];
        let shows = aggregate_tv(&items);

        assert_eq!(describe_show(&shows[0]), "Season 2, Episodes 1-3, 5");
        assert_eq!(shows[0].latest_added_at, 1700000500);
    }

    #[test]
    fn episodes_across_seasons_report_season_ranges_and_count() {
        let items = vec![
            episode("10", "Severance", 1, 9, "e9", 1),
            episode("10", "Severance", 2, 1, "e1", 2),
            episode("10", "Severance", 2, 2, "e2", 3),
            episode("10", "Severance", 4, 1, "e1", 4),
        ];
        let shows = aggregate_tv(&items);

        assert_eq!(describe_show(&shows[0]), "Seasons 1-2, 4, 4 episodes");
    }

    #[test]
    fn whole_season_uses_child_count() {
        let shows = aggregate_tv(&[season("20", "Andor", 2, 12)]);

        assert_eq!(describe_show(&shows[0]), "Season 2, 12 episodes");
        assert_eq!(shows[0].poster.as_deref(), Some("/library/metadata/20/thumb/2"));
    }

    #[test]
    fn whole_season_and_its_episodes_are_not_double_counted() {
        let items = vec![
            season("20", "Andor", 1, 3),
            episode("20", "Andor", 1, 1, "e1", 1),
            episode("20", "Andor", 1, 2, "e2", 2),
            episode("20", "Andor", 1, 3, "e3", 3),
        ];
        let shows = aggregate_tv(&items);

        assert_eq!(describe_show(&shows[0]), "Season 1, 3 episodes");
    }

    #[test]
    fn mixed_whole_season_and_loose_episodes_sum_episode_counts() {
        let items = vec![
            season("20", "Andor", 1, 12),
            episode("20", "Andor", 2, 1, "e1", 1),
            episode("20", "Andor", 2, 2, "e2", 2),
        ];
        let shows = aggregate_tv(&items);

        assert_eq!(describe_show(&shows[0]), "Seasons 1-2, 14 episodes");
    }

    #[test]
    fn whole_show_is_a_new_series() {
        let items = vec![
            item(json!({
                "media_type": "show",
                "added_at": "1700000000",
                "rating_key": "30",
                "title": "Slow Horses",
                "year": "2022",
                "child_count": "4",
                "summary": "Disgraced MI5 agents.",
                "thumb": "/library/metadata/30/thumb/9"
            })),
            episode("30", "Slow Horses", 4, 1, "e1", 1700000001),
        ];
        let shows = aggregate_tv(&items);

        assert_eq!(shows.len(), 1);
        assert_eq!(describe_show(&shows[0]), "New series, 4 seasons");
        assert_eq!(shows[0].year, Some(2022));
        assert_eq!(shows[0].overview.as_deref(), Some("Disgraced MI5 agents."));
        assert_eq!(shows[0].poster.as_deref(), Some("/library/metadata/30/thumb/9"));
    }

    #[test]
    fn episodes_without_numbers_fall_back_to_new_episodes() {
        let shows = aggregate_tv(&[
            item(json!({
                "media_type": "episode",
                "added_at": 1,
                "grandparent_title": "Mystery Show"
            })),
            item(json!({
                "media_type": "episode",
                "added_at": 2,
                "grandparent_title": "Mystery Show"
            })),
        ]);

        assert_eq!(shows.len(), 1);
        assert_eq!(describe_show(&shows[0]), "New episodes");
    }

    #[test]
    fn unnumbered_season_falls_back_to_its_summary() {
        let shows = aggregate_tv(&[item(json!({
            "media_type": "season",
            "added_at": 1,
            "parent_rating_key": "40",
            "parent_title": "The Bear",
            "summary": "Carmy chases a star."
        }))]);

        assert_eq!(describe_show(&shows[0]), "Carmy chases a star.");
        let embed = format_show(&shows[0], None);
        assert_eq!(embed.description.as_deref(), Some("Carmy chases a star."));
        assert!(embed.fields.is_empty());
    }

    #[test]
    fn unnumbered_episode_counts_next_to_a_numbered_one() {
        let shows = aggregate_tv(&[
            episode("50", "Mixed", 1, 1, "Pilot", 2),
            item(json!({
                "media_type": "episode",
                "added_at": 1,
                "grandparent_rating_key": "50",
                "grandparent_title": "Mixed"
            })),
        ]);

        assert_eq!(shows[0].total_episodes(), 2);
        assert_eq!(describe_show(&shows[0]), "Season 1, 2 episodes");
    }

    #[test]
    fn unnumbered_episode_counts_across_seasons() {
        let shows = aggregate_tv(&[
            episode("50", "Mixed", 1, 1, "e1", 3),
            episode("50", "Mixed", 3, 1, "e1", 2),
            item(json!({
                "media_type": "episode",
                "added_at": 1,
                "grandparent_rating_key": "50",
                "grandparent_title": "Mixed"
            })),
        ]);

        assert_eq!(describe_show(&shows[0]), "Seasons 1, 3, 3 episodes");
    }

    #[test]
    fn shows_keep_first_seen_order_and_skip_movies() {
        let items = vec![
            episode("2", "B Show", 1, 1, "e1", 30),
            item(json!({ "media_type": "movie", "added_at": 25, "title": "Heat" })),
            episode("1", "A Show", 1, 1, "e1", 20),
            episode("2", "B Show", 1, 2, "e2", 10),
        ];
        let shows = aggregate_tv(&items);

        let titles: Vec<&str> = shows.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["B Show", "A Show"]);
    }

    #[test]
    fn episode_synopses_are_not_used_as_the_show_overview() {
        let items = vec![
            episode("10", "Severance", 2, 1, "Hello, Ms. Cobel", 1700000000),
            episode("10", "Severance", 2, 2, "Goodbye, Mrs. Selvig", 1700000060),
        ];
        let shows = aggregate_tv(&items);
        let embed = format_show(&shows[0], None);

        assert!(shows[0].overview.is_none());
        assert_eq!(embed.description.as_deref(), Some("Season 2, Episodes 1-2"));
        assert!(embed.fields.is_empty());
    }

    #[test]
    fn season_summary_becomes_the_overview() {
        let mut whole = season("20", "Andor", 2, 12);
        whole.summary = Some("One year at a time.".to_string());
        let shows = aggregate_tv(&[whole]);
        let embed = format_show(&shows[0], None);

        assert_eq!(embed.description.as_deref(), Some("Season 2, 12 episodes"));
        assert_eq!(
            embed.fields,
            vec![EmbedField::block("Overview", "One year at a time.")]
        );
    }

    #[test]
    fn show_embed_carries_latest_timestamp() {
        let items = vec![
            episode("10", "Severance", 2, 1, "Hello, Ms. Cobel", 1700000000),
            episode("10", "Severance", 2, 2, "Goodbye, Mrs. Selvig", 1700000060),
        ];
        let shows = aggregate_tv(&items);
        let embed = format_show(&shows[0], Some("attachment://poster-10.jpg".to_string()));

        assert_eq!(embed.title, "Severance");
        assert_eq!(embed.description.as_deref(), Some("Season 2, Episodes 1-2"));
        assert_eq!(embed.timestamp.as_deref(), Some("2023-11-14T22:14:20+00:00"));
        assert_eq!(embed.image.unwrap().url, "attachment://poster-10.jpg");
        assert_eq!(embed.footer.unwrap().text, "TV Shows");
        assert_eq!(embed.color, Some(colors::TV));
    }
}
