use crate::api::Movie;
use crate::boxes::Mp4Box;
use crate::info::{FileSummary, TrackSummary, summarize_file, summarize_track};
use serde::Serialize;

/// Output shape selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// File and per-track aggregates only.
    Summary,
    /// Adds the full decoded box tree.
    Detailed,
}

/// Structured analysis result, directly serializable to JSON.
///
/// A pure transformation of the already-built movie: no box is
/// re-parsed here. Malformed boxes and inconsistent tracks surface as
/// explicit markers, never silently.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub file: FileSummary,
    pub tracks: Vec<TrackSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boxes: Option<Vec<Mp4Box>>,
    #[serde(skip_serializing_if = "is_zero")]
    pub trailing_bytes: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

pub fn build_report(movie: Movie, data_len: u64, verbosity: Verbosity) -> Report {
    let tracks: Vec<TrackSummary> = movie.tracks.iter().map(summarize_track).collect();
    let file = summarize_file(data_len, &movie.boxes, &tracks);
    let boxes = match verbosity {
        Verbosity::Summary => None,
        Verbosity::Detailed => Some(movie.boxes),
    };
    Report {
        file,
        tracks,
        boxes,
        trailing_bytes: movie.trailing_bytes,
    }
}
