use crate::boxes::{BoxFields, Mp4Box};
use crate::samples::FrameType;
use crate::track::Track;
use serde::Serialize;

/// File-level aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major_brand: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub compatible_brands: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timescale: Option<u32>,
    /// From `mvhd` when present, else the longest track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// Unavailable (null) when the duration is zero or unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_bps: Option<u64>,
    pub track_count: usize,
    pub has_iods: bool,
}

/// Per-frame-type sample tally.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FrameTypeCounts {
    pub i: u32,
    pub p: u32,
    pub b: u32,
    pub unknown: u32,
}

/// Per-track aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSummary {
    pub track_id: u32,
    pub handler_type: String,
    /// "video", "audio", "hint" or "other".
    pub kind: &'static str,
    pub codec: String,
    pub timescale: u32,
    /// DTS span divided by the media timescale; `mdhd` duration when the
    /// track has no samples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub sample_count: usize,
    pub sync_sample_count: usize,
    /// Unavailable (null) when duration or sample count is zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_bps: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_count: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub frame_types: FrameTypeCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn track_kind(handler_type: &str) -> &'static str {
    match handler_type {
        "vide" => "video",
        "soun" => "audio",
        "hint" => "hint",
        _ => "other",
    }
}

/// DTS span of a track's samples in seconds.
fn track_duration_seconds(track: &Track) -> Option<f64> {
    if track.timescale == 0 {
        return None;
    }
    let span = match track.samples.last() {
        Some(last) => last.dts + last.duration as u64,
        None if track.duration > 0 => track.duration,
        None => return None,
    };
    Some(span as f64 / track.timescale as f64)
}

pub fn summarize_track(track: &Track) -> TrackSummary {
    let duration_seconds = track_duration_seconds(track);
    let total_bytes: u64 = track.samples.iter().map(|s| s.size as u64).sum();
    let bitrate_bps = match duration_seconds {
        Some(d) if d > 0.0 && !track.samples.is_empty() => {
            Some((total_bytes as f64 * 8.0 / d) as u64)
        }
        _ => None,
    };

    let mut frame_types = FrameTypeCounts::default();
    for s in &track.samples {
        match s.frame_type {
            FrameType::I => frame_types.i += 1,
            FrameType::P => frame_types.p += 1,
            FrameType::B => frame_types.b += 1,
            FrameType::Unknown => frame_types.unknown += 1,
        }
    }

    TrackSummary {
        track_id: track.track_id,
        handler_type: track.handler_type.clone(),
        kind: track_kind(&track.handler_type),
        codec: track.codec.codec_string(),
        timescale: track.timescale,
        duration_seconds,
        sample_count: track.samples.len(),
        sync_sample_count: track.samples.iter().filter(|s| s.is_sync).count(),
        bitrate_bps,
        width: track.width,
        height: track.height,
        channel_count: track.channel_count,
        audio_sample_rate: track.audio_sample_rate,
        language: track.language.clone(),
        frame_types,
        error: track.sample_table_error.clone(),
    }
}

/// Depth-first search for a box type anywhere in the tree.
fn tree_contains(boxes: &[Mp4Box], typ: &[u8; 4]) -> bool {
    boxes
        .iter()
        .any(|b| &b.typ.0 == typ || tree_contains(&b.children, typ))
}

pub fn summarize_file(data_len: u64, boxes: &[Mp4Box], tracks: &[TrackSummary]) -> FileSummary {
    let ftyp = boxes.iter().find_map(|b| match &b.fields {
        BoxFields::Ftyp(f) => Some(f),
        _ => None,
    });
    let mvhd = boxes
        .iter()
        .find(|b| &b.typ.0 == b"moov")
        .and_then(|moov| {
            moov.children.iter().find_map(|b| match &b.fields {
                BoxFields::Mvhd(m) => Some(m),
                _ => None,
            })
        });
    let has_iods = tree_contains(boxes, b"iods");

    let duration_seconds = match mvhd {
        Some(m) if m.timescale > 0 && m.duration > 0 => {
            Some(m.duration as f64 / m.timescale as f64)
        }
        _ => tracks
            .iter()
            .filter_map(|t| t.duration_seconds)
            .fold(None, |acc: Option<f64>, d| {
                Some(acc.map_or(d, |a| a.max(d)))
            }),
    };
    let bitrate_bps = match duration_seconds {
        Some(d) if d > 0.0 => Some((data_len as f64 * 8.0 / d) as u64),
        _ => None,
    };

    FileSummary {
        size_bytes: data_len,
        major_brand: ftyp.map(|f| f.major_brand.clone()),
        compatible_brands: ftyp.map(|f| f.compatible_brands.clone()).unwrap_or_default(),
        timescale: mvhd.map(|m| m.timescale),
        duration_seconds,
        bitrate_bps,
        track_count: tracks.len(),
        has_iods,
    }
}
