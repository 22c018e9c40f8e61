use std::{collections::HashSet, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

use crate::types::Artist;

/// A steady-ticking spinner for long-running CLI calls.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// Extracts the bare id from an id, a `spotify:` URI or an `open.spotify.com` link.
pub fn extract_id(input: &str) -> String {
    let trimmed = input.trim();

    if let Some(rest) = trimmed.strip_prefix("spotify:") {
        return rest.rsplit(':').next().unwrap_or(rest).to_string();
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        if let Ok(url) = url::Url::parse(trimmed) {
            if let Some(last) = url.path_segments().and_then(|s| s.filter(|p| !p.is_empty()).last()) {
                return last.to_string();
            }
        }
    }

    trimmed.to_string()
}

/// Splits comma separated arguments into ids, dropping blanks and duplicates while
/// keeping first-seen order.
pub fn parse_ids(inputs: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .flat_map(|input| input.split(','))
        .map(extract_id)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// `m:ss`, or `h:mm:ss` from one hour on.
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    let (hours, minutes, seconds) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

pub fn sort_artists_by_name(artists: &mut [Artist]) {
    artists.sort_by_key(|a| a.name.to_lowercase());
}
