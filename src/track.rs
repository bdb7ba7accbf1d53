use crate::boxes::{BoxFields, Mp4Box};
use crate::descriptors::CodecConfig;
use crate::samples::{Sample, SampleTables, build_samples};
use serde::Serialize;
use tracing::warn;

/// One media track, built once from a `trak` subtree. Owns its samples.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    pub track_id: u32,
    /// Handler four-character code, e.g. "vide", "soun", "hint".
    pub handler_type: String,
    /// Ticks per second of this track's media timeline.
    pub timescale: u32,
    /// Duration in media timescale units, from `mdhd`.
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Sample entry four-character code from `stsd`, e.g. "avc1".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_entry: Option<String>,
    pub codec: CodecConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_count: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_sample_rate: Option<u32>,

    #[serde(skip_serializing)]
    pub samples: Vec<Sample>,
    /// Set when the sample tables were inconsistent; the sample list is
    /// empty in that case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_table_error: Option<String>,
}

/// Build one `Track` per `trak` box under every `moov`.
pub fn tracks_from_boxes(boxes: &[Mp4Box], file_len: u64) -> Vec<Track> {
    let mut tracks = Vec::new();
    for moov in boxes.iter().filter(|b| &b.typ.0 == b"moov") {
        for trak in moov.children.iter().filter(|b| &b.typ.0 == b"trak") {
            tracks.push(build_track(trak, file_len));
        }
    }
    tracks
}

fn build_track(trak: &Mp4Box, file_len: u64) -> Track {
    let tkhd = trak.child(b"tkhd").and_then(|b| match &b.fields {
        BoxFields::Tkhd(t) => Some(t),
        _ => None,
    });
    let mdhd = trak.descend(&[b"mdia", b"mdhd"]).and_then(|b| match &b.fields {
        BoxFields::Mdhd(m) => Some(m),
        _ => None,
    });
    let hdlr = trak.descend(&[b"mdia", b"hdlr"]).and_then(|b| match &b.fields {
        BoxFields::Hdlr(h) => Some(h),
        _ => None,
    });

    let track_id = tkhd.map(|t| t.track_id).unwrap_or(0);
    let handler_type = hdlr
        .map(|h| h.handler_type.clone())
        .unwrap_or_else(|| "????".to_string());
    let timescale = mdhd.map(|m| m.timescale).unwrap_or(0);
    let duration = mdhd.map(|m| m.duration).unwrap_or(0);
    let language = mdhd.map(|m| m.language.clone());

    let stbl = trak.descend(&[b"mdia", b"minf", b"stbl"]);
    let (samples, sample_table_error) = match stbl {
        Some(stbl) => {
            let tables = SampleTables::from_stbl(stbl);
            match build_samples(&tables, file_len) {
                Ok(samples) => (samples, None),
                Err(e) => {
                    warn!(track_id, error = %e, "dropping samples for track");
                    (Vec::new(), Some(e.to_string()))
                }
            }
        }
        None => (Vec::new(), None),
    };

    let entry = stbl
        .and_then(|s| s.child(b"stsd"))
        .and_then(|stsd| stsd.children.first());
    let (sample_entry, codec, dims, audio) = describe_entry(entry);

    Track {
        track_id,
        handler_type,
        timescale,
        duration,
        language,
        sample_entry,
        codec,
        width: dims.map(|(w, _)| w),
        height: dims.map(|(_, h)| h),
        channel_count: audio.map(|(c, _)| c),
        audio_sample_rate: audio.map(|(_, r)| r),
        samples,
        sample_table_error,
    }
}

type EntryInfo = (
    Option<String>,
    CodecConfig,
    Option<(u16, u16)>,
    Option<(u16, u32)>,
);

/// Derive codec configuration and media dimensions from the first
/// sample entry. Anything unrecognized becomes `CodecConfig::Unknown`.
fn describe_entry(entry: Option<&Mp4Box>) -> EntryInfo {
    let entry = match entry {
        Some(e) => e,
        None => return (None, CodecConfig::Unknown, None, None),
    };
    let name = Some(entry.typ.to_string());

    match &entry.fields {
        BoxFields::Avc1(visual) => {
            let codec = entry
                .child(b"avcC")
                .and_then(|b| match &b.fields {
                    BoxFields::AvcC(cfg) => Some(CodecConfig::Avc(cfg.clone())),
                    _ => None,
                })
                .unwrap_or(CodecConfig::Unknown);
            (name, codec, Some((visual.width, visual.height)), None)
        }
        BoxFields::Mp4a(audio) => {
            let codec = entry
                .child(b"esds")
                .and_then(|b| match &b.fields {
                    BoxFields::Esds(es) => Some(CodecConfig::from_es(es.clone())),
                    _ => None,
                })
                .unwrap_or(CodecConfig::Unknown);
            (
                name,
                codec,
                None,
                Some((audio.channel_count, audio.sample_rate)),
            )
        }
        _ => (name, CodecConfig::Unknown, None, None),
    }
}
