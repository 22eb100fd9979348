// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use url::Url;

use crate::error::UrlError;

/// Host of the podcast platform serving episode pages
pub const PLATFORM_HOST: &str = "www.xiaoyuzhoufm.com";

/// Normalized identity of a target episode.
///
/// Only `validate` produces one; invalid input never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRef {
    /// Identifier from the /episode/<id> path segment
    pub episode_id: String,
    /// Canonical https URL with query, fragment, and trailing slash removed
    pub canonical_url: String,
}

/// Validate a user-supplied episode URL and normalize it.
///
/// Accepts http(s) URLs on `www.xiaoyuzhoufm.com` (the bare apex is
/// normalized to the www form) whose path is `/episode/<id>` with an
/// ASCII-alphanumeric identifier. Performs no I/O.
pub fn validate(input: &str) -> Result<EpisodeRef, UrlError> {
    let trimmed = input.trim();

    let parsed = Url::parse(trimmed).map_err(|e| UrlError::Malformed {
        input: trimmed.to_string(),
        source: e,
    })?;

    let host = parsed.host_str().unwrap_or("");
    if !matches!(parsed.scheme(), "http" | "https")
        || (host != PLATFORM_HOST && host != "xiaoyuzhoufm.com")
    {
        return Err(UrlError::UnsupportedHost {
            host: host.to_string(),
        });
    }

    let episode_id = episode_id_from_path(&parsed).ok_or_else(|| UrlError::MissingEpisodeId {
        url: trimmed.to_string(),
    })?;

    if episode_id.is_empty() || !episode_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(UrlError::InvalidEpisodeId {
            id: episode_id.to_string(),
        });
    }

    Ok(EpisodeRef {
        episode_id: episode_id.to_string(),
        canonical_url: format!("https://{PLATFORM_HOST}/episode/{episode_id}"),
    })
}

/// Extract the identifier from a /episode/<id> path, tolerating a single
/// trailing slash
fn episode_id_from_path(url: &Url) -> Option<&str> {
    let mut segments = url.path_segments()?;

    if segments.next()? != "episode" {
        return None;
    }
    let id = segments.next()?;

    // Anything after the id (ignoring a trailing slash) is not an episode page
    match segments.next() {
        None | Some("") => Some(id),
        Some(_) => None,
    }
}
