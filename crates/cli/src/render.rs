//! Plain-text rendering of the list and detail screens.

use std::fmt::Write;

use animedex_client::{DetailView, ListView, PageControls};
use animedex_core::{AnimeDetail, AnimeSummary};
use chrono::{DateTime, Local, Utc};

const SYNOPSIS_EXCERPT: usize = 280;

pub fn list(view: &ListView, updated_at: Option<DateTime<Utc>>) -> String {
    let mut out = String::new();
    match view {
        ListView::Loading { placeholder: None } => out.push_str("Loading...\n"),
        ListView::Loading { placeholder: Some(previous) } => {
            out.push_str("Loading... (showing previous page)\n");
            for anime in &previous.items {
                summary_line(&mut out, anime);
            }
        }
        ListView::Error { message, throttled } => {
            if *throttled {
                out.push_str("Rate limit exceeded. Wait a moment, then `retry`.\n");
            } else {
                let _ = writeln!(out, "Failed to load anime data: {message}");
                out.push_str("Type `retry` to try again.\n");
            }
        }
        ListView::Empty { search: Some(search) } => {
            let _ = writeln!(out, "No anime found for {search:?}.");
            out.push_str("Type `clear` to reset the search.\n");
        }
        ListView::Empty { search: None } => out.push_str("No anime found.\n"),
        ListView::Populated { page, controls, fetching } => {
            for anime in &page.items {
                summary_line(&mut out, anime);
            }
            out.push_str(&footer(controls, *fetching, updated_at));
        }
    }
    out
}

pub fn detail(view: &DetailView, full: bool) -> String {
    match view {
        DetailView::Loading => "Loading...\n".to_string(),
        DetailView::Error { throttled: true, .. } => "Rate limit exceeded. Wait a moment, then `retry`.\n".to_string(),
        DetailView::Error { message, .. } => format!("Failed to load anime: {message}\nType `retry` or `back`.\n"),
        DetailView::Loaded(anime) => detail_body(anime, full),
    }
}

fn summary_line(out: &mut String, anime: &AnimeSummary) {
    let score = anime.score.map(|s| format!("{s:.2}")).unwrap_or_else(|| "-".to_string());
    let episodes = anime.episodes.map(|e| e.to_string()).unwrap_or_else(|| "?".to_string());
    let _ = write!(out, "{:>6}  {}", anime.mal_id, anime.title);
    if let Some(english) = anime.title_english.as_deref().filter(|e| *e != anime.title) {
        let _ = write!(out, " ({english})");
    }
    let _ = writeln!(out, "  [score {score}, {episodes} eps]");
}

fn footer(controls: &PageControls, fetching: bool, updated_at: Option<DateTime<Utc>>) -> String {
    let mut line = format!("page {} of {}", controls.current, controls.total);
    if controls.has_prev {
        line.push_str("  < prev");
    }
    if controls.has_next {
        line.push_str("  next >");
    }
    if fetching {
        line.push_str("  (refreshing)");
    } else if let Some(at) = updated_at {
        let _ = write!(line, "  (updated {})", at.with_timezone(&Local).format("%H:%M:%S"));
    }
    line.push('\n');
    line
}

fn detail_body(anime: &AnimeDetail, full: bool) -> String {
    let summary = &anime.summary;
    let mut out = format!("{}\n", summary.title);
    if let Some(english) = &summary.title_english {
        let _ = writeln!(out, "{english}");
    }
    out.push('\n');

    let mut facts = Vec::new();
    if let Some(score) = summary.score {
        facts.push(format!("score {score:.2}"));
    }
    if let Some(rank) = anime.rank {
        facts.push(format!("rank #{rank}"));
    }
    if let Some(episodes) = summary.episodes {
        facts.push(format!("{episodes} episodes"));
    }
    if let Some(status) = &summary.status {
        facts.push(status.clone());
    }
    if let Some(year) = summary.year {
        facts.push(year.to_string());
    }
    if !facts.is_empty() {
        let _ = writeln!(out, "{}", facts.join(" | "));
    }

    if !anime.studios.is_empty() {
        let studios: Vec<&str> = anime.studios.iter().map(|s| s.name.as_str()).collect();
        let _ = writeln!(out, "studios: {}", studios.join(", "));
    }
    if !summary.genres.is_empty() {
        let genres: Vec<&str> = summary.genres.iter().map(|g| g.name.as_str()).collect();
        let _ = writeln!(out, "genres: {}", genres.join(", "));
    }
    if let Some(image) = summary.images.large() {
        let _ = writeln!(out, "image: {image}");
    }

    let synopsis = if full { anime.synopsis.clone() } else { anime.synopsis_excerpt(SYNOPSIS_EXCERPT) };
    match synopsis {
        Some(text) => {
            let _ = writeln!(out, "\n{text}");
        }
        None => out.push_str("\nNo synopsis available.\n"),
    }
    out
}
