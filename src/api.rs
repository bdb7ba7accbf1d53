use crate::boxes::Mp4Box;
use crate::error::Result;
use crate::parser::parse_tree;
use crate::report::{Report, Verbosity, build_report};
use crate::track::{Track, tracks_from_boxes};

/// Fully parsed movie: the box tree plus the extracted tracks with
/// their owned sample sequences.
///
/// This is the contract surface for a decoder collaborator: each
/// sample's `offset`/`size` plus the track's codec configuration is
/// everything needed to fetch and decode the payload bytes.
#[derive(Debug, Clone)]
pub struct Movie {
    pub boxes: Vec<Mp4Box>,
    pub tracks: Vec<Track>,
    /// Unparsed bytes at the end of the top-level stream.
    pub trailing_bytes: u64,
}

/// Parse an MP4 buffer into its box tree and tracks.
///
/// Best-effort: malformed boxes become marker nodes, tracks with
/// inconsistent tables keep their metadata but lose their samples. The
/// only error is a buffer too short for one box header.
///
/// ```no_run
/// let data = std::fs::read("video.mp4")?;
/// let movie = mp4analyzer::parse(&data)?;
/// for track in &movie.tracks {
///     println!("track {}: {} samples", track.track_id, track.samples.len());
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn parse(data: &[u8]) -> Result<Movie> {
    let tree = parse_tree(data)?;
    let tracks = tracks_from_boxes(&tree.boxes, data.len() as u64);
    Ok(Movie {
        boxes: tree.boxes,
        tracks,
        trailing_bytes: tree.trailing,
    })
}

/// Parse an MP4 buffer and aggregate it into a serializable [`Report`].
pub fn report(data: &[u8], verbosity: Verbosity) -> Result<Report> {
    let movie = parse(data)?;
    Ok(build_report(movie, data.len() as u64, verbosity))
}
