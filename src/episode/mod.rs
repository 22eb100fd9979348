mod extract;
mod filename;
mod url;

pub use extract::{EpisodeMetadata, extract};
pub use filename::{MAX_FILENAME_LENGTH, file_name, sanitize};
pub use url::{EpisodeRef, PLATFORM_HOST, validate};
