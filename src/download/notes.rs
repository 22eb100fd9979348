use std::path::Path;

use chrono::Utc;

use crate::episode::{EpisodeMetadata, EpisodeRef};
use crate::error::DownloadError;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Placeholder used when the page carried no show notes
const NO_SHOW_NOTES: &str = "暂无节目介绍";

/// Write the show-notes Markdown file.
///
/// A failed write removes whatever was created so no partial notes file
/// is left behind. Returns the number of bytes written.
pub(crate) async fn write_notes(
    episode: &EpisodeRef,
    metadata: &EpisodeMetadata,
    path: &Path,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let content = build_notes(episode, metadata);
    let bytes = content.len() as u64;

    if let Err(e) = tokio::fs::write(path, &content).await {
        let _ = tokio::fs::remove_file(path).await;
        return Err(DownloadError::FileWriteFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }

    reporter.report(ProgressEvent::NotesWritten {
        path: path.to_path_buf(),
    });

    Ok(bytes)
}

/// Compose the notes document: YAML front matter, title heading, and the
/// show-notes body
fn build_notes(episode: &EpisodeRef, metadata: &EpisodeMetadata) -> String {
    let show_notes = if metadata.show_notes.is_empty() {
        NO_SHOW_NOTES
    } else {
        metadata.show_notes.as_str()
    };

    format!(
        "---\n\
         title: \"{title}\"\n\
         host: \"{host}\"\n\
         episode_id: \"{id}\"\n\
         source_url: \"{url}\"\n\
         fetched_at: \"{fetched_at}\"\n\
         ---\n\
         \n\
         # {title}\n\
         \n\
         ## Show Notes\n\
         \n\
         {show_notes}\n",
        title = yaml_escape(&metadata.title),
        host = yaml_escape(&metadata.host),
        id = episode.episode_id,
        url = episode.canonical_url,
        fetched_at = Utc::now().to_rfc3339(),
    )
}

fn yaml_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
