// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Episode page extraction.
//!
//! The platform's markup is not contractually stable, so every structural
//! assumption (selectors, the title delimiter convention) lives behind
//! `extract`. Audio lookup mirrors the page's own fallback chain: the
//! JSON-LD episode payload first, then a bare `<audio>` element.

use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractError;

/// Metadata record produced once per successful extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMetadata {
    /// Episode title (the part before " - " in the page title)
    pub title: String,
    /// Host/podcast name (the part after " - ")
    pub host: String,
    /// Direct URL of the audio payload
    pub audio_url: String,
    /// Show-notes text, empty when the page carries none
    pub show_notes: String,
}

/// Extract episode metadata from raw page HTML.
///
/// Fails with `ExtractError::AudioMissing` when no audio source can be
/// located anywhere in the page, and with `ExtractError::TitleMissing`
/// when the `<title>` element is absent or does not follow the platform's
/// `"<show title> - <host> | <platform>"` convention. Show notes are
/// optional; their absence yields an empty string.
pub fn extract(html: &str) -> Result<EpisodeMetadata, ExtractError> {
    let document = Html::parse_document(html);

    let audio_url = extract_audio_url(&document).ok_or(ExtractError::AudioMissing)?;
    let (title, host) = extract_title_parts(&document).ok_or(ExtractError::TitleMissing)?;
    let show_notes = extract_show_notes(&document);

    Ok(EpisodeMetadata {
        title,
        host,
        audio_url,
        show_notes,
    })
}

/// Locate the audio source URL: JSON-LD payload first, `<audio>` fallback
fn extract_audio_url(document: &Html) -> Option<String> {
    json_ld_audio_url(document).or_else(|| audio_element_url(document))
}

fn json_ld_audio_url(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"script[name="schema:podcast-show"][type="application/ld+json"]"#)
        .expect("valid JSON-LD selector");

    for script in document.select(&selector) {
        let raw = script.text().collect::<String>();
        let Ok(json) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };

        if let Some(url) = json
            .get("associatedMedia")
            .and_then(|media| media.get("contentUrl"))
            .and_then(|url| url.as_str())
            .filter(|url| !url.is_empty())
        {
            return Some(url.to_string());
        }
    }

    None
}

fn audio_element_url(document: &Html) -> Option<String> {
    let selector =
        Selector::parse("audio[src], audio source[src]").expect("valid audio selector");

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .find(|src| !src.is_empty())
        .map(String::from)
}

/// Split the page title into (episode title, host name).
///
/// Page titles follow `"<show title> - <host> | <platform>"`; the platform
/// suffix is dropped and the first " - " separates the pair.
fn extract_title_parts(document: &Html) -> Option<(String, String)> {
    let selector = Selector::parse("title").expect("valid title selector");
    let raw = document.select(&selector).next()?.text().collect::<String>();

    let without_platform = match raw.split_once('|') {
        Some((before, _)) => before,
        None => raw.as_str(),
    };

    let (title, host) = without_platform.split_once(" - ")?;
    // A second " - " belongs to neither part; the platform only ever
    // emits one delimiter, so keep the segment directly after it.
    let host = host.split(" - ").next()?;

    let title = title.trim();
    let host = host.trim();
    if title.is_empty() || host.is_empty() {
        return None;
    }

    Some((title.to_string(), host.to_string()))
}

/// Pull show-notes text out of the page.
///
/// Prefers the dedicated show-notes article, falling back to the page's
/// meta descriptions. Absence is not an error.
fn extract_show_notes(document: &Html) -> String {
    if let Some(text) = show_notes_article(document) {
        return text;
    }

    meta_description(document).unwrap_or_default()
}

fn show_notes_article(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"section[aria-label="节目show notes"] article"#)
        .expect("valid show-notes selector");
    let article = document.select(&selector).next()?;

    let paragraph = Selector::parse("p, h1, h2, h3").expect("valid paragraph selector");
    let parts: Vec<String> = article
        .select(&paragraph)
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect();

    if parts.is_empty() {
        // Article without block elements still counts when it has bare text
        let flat = normalize_whitespace(&article.text().collect::<String>());
        return if flat.is_empty() { None } else { Some(flat) };
    }

    Some(parts.join("\n\n"))
}

fn meta_description(document: &Html) -> Option<String> {
    let selector =
        Selector::parse(r#"meta[name="description"], meta[property="og:description"]"#)
            .expect("valid meta selector");

    document
        .select(&selector)
        .filter_map(|el: ElementRef| el.value().attr("content"))
        .map(|content| normalize_whitespace(&html_escape::decode_html_entities(content)))
        .find(|content| !content.is_empty())
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
