use crate::format::time::{duration_to_str, epoch_to_iso8601, format_originally_available_date};
use crate::notify::discord::{colors, limits, Embed, EmbedField, EmbedFooter, EmbedImage};
use crate::notify::payload::truncate;
use crate::services::tautulli::RecentlyAddedItem;

/// `"Heat (1995)"`, or just the title when the year is unknown.
pub fn title_with_year(title: &str, year: Option<u64>) -> String {
    match year {
        Some(year) => format!("{} ({})", title, year),
        None => title.to_string(),
    }
}

/// Build the embed for a newly added movie.
///
/// `image` is the value for the embed image, usually an
/// `attachment://` reference to the uploaded poster.
pub fn format_movie(movie: &RecentlyAddedItem, image: Option<String>) -> Embed {
    let title = title_with_year(movie.title.as_deref().unwrap_or("Untitled"), movie.year);

    let mut fields = Vec::new();
    if !movie.directors.is_empty() {
        fields.push(EmbedField::inline(
            "Director",
            truncate(&movie.directors.join(" & "), limits::FIELD_VALUE_CHARS),
        ));
    }
    if let Some(duration) = movie.duration.filter(|d| *d > 0) {
        fields.push(EmbedField::inline("Runtime", duration_to_str(duration)));
    }
    let released = format_originally_available_date(movie.originally_available_at.as_deref());
    if !released.is_empty() {
        fields.push(EmbedField::inline("Released", released));
    }

    Embed {
        title: truncate(&title, limits::TITLE_CHARS),
        description: movie
            .summary
            .as_deref()
            .map(|summary| truncate(summary, limits::DESCRIPTION_CHARS)),
        fields,
        image: image.map(|url| EmbedImage { url }),
        timestamp: epoch_to_iso8601(movie.added_at),
        color: Some(colors::MOVIE),
        footer: movie
            .library_name
            .as_ref()
            .map(|library| EmbedFooter { text: library.clone() }),
    }
}
