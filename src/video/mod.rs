//! Video Candidate Resolution
//!
//! Video is streamed by the player, not fetched through the cache. This
//! module only supplies the ordered alternative URLs and the cursor the
//! player advances on each playback error.

mod candidates;
mod playback;

pub use candidates::{
    build_candidates, extract_file_id, CandidateOptions, MediaDescriptor, VideoHostConfig,
    FILE_ID_PLACEHOLDER,
};
pub use playback::{PlaybackCursor, PlaybackStatus};
