use crate::boxes::{BoxFields, Mp4Box};
use crate::decode::{Co64Box, CttsBox, SdtpBox, StcoBox, StscBox, StssBox, SttsBox, StszBox};
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// Frame classification derived from the sample tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameType {
    I,
    P,
    B,
    Unknown,
}

/// One media sample, in decode (storage) order.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    /// 0-based position in decode order.
    pub index: u32,
    /// Absolute byte offset in the file.
    pub offset: u64,
    /// Sample size in bytes.
    pub size: u32,
    /// Decode timestamp in track timescale units; non-decreasing by
    /// construction.
    pub dts: u64,
    /// Presentation timestamp: DTS + composition offset. May run
    /// negative with version-1 `ctts` offsets.
    pub pts: i64,
    /// Duration in track timescale units (the sample's stts delta).
    pub duration: u32,
    pub is_sync: bool,
    pub frame_type: FrameType,
}

/// Borrowed view over one track's decoded sample-table boxes.
#[derive(Debug, Default)]
pub struct SampleTables<'a> {
    pub stts: Option<&'a SttsBox>,
    pub ctts: Option<&'a CttsBox>,
    pub stss: Option<&'a StssBox>,
    pub sdtp: Option<&'a SdtpBox>,
    pub stsc: Option<&'a StscBox>,
    pub stsz: Option<&'a StszBox>,
    pub stco: Option<&'a StcoBox>,
    pub co64: Option<&'a Co64Box>,
}

impl<'a> SampleTables<'a> {
    /// Collect table references from an `stbl` box's children.
    pub fn from_stbl(stbl: &'a Mp4Box) -> Self {
        let mut t = SampleTables::default();
        for child in &stbl.children {
            match &child.fields {
                BoxFields::Stts(b) => t.stts = Some(b),
                BoxFields::Ctts(b) => t.ctts = Some(b),
                BoxFields::Stss(b) => t.stss = Some(b),
                BoxFields::Sdtp(b) => t.sdtp = Some(b),
                BoxFields::Stsc(b) => t.stsc = Some(b),
                BoxFields::Stsz(b) => t.stsz = Some(b),
                BoxFields::Stco(b) => t.stco = Some(b),
                BoxFields::Co64(b) => t.co64 = Some(b),
                _ => {}
            }
        }
        t
    }

    fn chunk_offsets(&self) -> Option<Vec<u64>> {
        if let Some(co64) = self.co64 {
            Some(co64.chunk_offsets.clone())
        } else {
            self.stco
                .map(|stco| stco.chunk_offsets.iter().map(|&o| o as u64).collect())
        }
    }
}

/// Reconstruct the decode-ordered sample sequence from one track's
/// tables.
///
/// A track with no size table at all yields an empty sequence. Any
/// cross-table count mismatch yields [`Error::InconsistentSampleTable`];
/// the caller drops that track's samples and other tracks are
/// unaffected. `file_len` bounds the sample count in fixed-size `stsz`
/// mode, where no table length otherwise constrains it.
pub fn build_samples(tables: &SampleTables<'_>, file_len: u64) -> Result<Vec<Sample>> {
    let stsz = match tables.stsz {
        Some(s) => s,
        None => return Ok(Vec::new()),
    };
    let count = stsz.sample_count as usize;
    if count == 0 {
        return Ok(Vec::new());
    }

    // fixed-size mode carries no table whose length bounds the count,
    // so the file length has to back the declared total
    if stsz.sample_size != 0 {
        let declared = stsz.sample_count as u64 * stsz.sample_size as u64;
        if declared > file_len {
            return Err(Error::InconsistentSampleTable(format!(
                "fixed-size stsz declares {declared} sample bytes in a {file_len}-byte file"
            )));
        }
    }

    let stsc = tables
        .stsc
        .ok_or_else(|| Error::InconsistentSampleTable("stsz present but stsc missing".into()))?;
    let chunk_offsets = tables
        .chunk_offsets()
        .ok_or_else(|| Error::InconsistentSampleTable("stsz present but stco/co64 missing".into()))?;
    let stts = tables
        .stts
        .ok_or_else(|| Error::InconsistentSampleTable("stsz present but stts missing".into()))?;

    // 1. expand stsc runs into a per-chunk sample count
    let samples_per_chunk = expand_chunk_runs(stsc, chunk_offsets.len(), count)?;

    // 2. decode timestamps from stts runs (validates the run totals and
    //    the timeline span before anything is allocated per sample)
    let (dts, durations) = expand_time_runs(stts, count)?;

    // 3. byte offsets: chunk base + accumulated sizes within the chunk
    let size_of = |i: usize| -> u32 {
        if stsz.sample_size != 0 {
            stsz.sample_size
        } else {
            stsz.sample_sizes[i]
        }
    };
    let mut offsets = Vec::with_capacity(count);
    let mut index = 0usize;
    for (chunk, &n) in samples_per_chunk.iter().enumerate() {
        let mut off = chunk_offsets[chunk];
        for _ in 0..n {
            offsets.push(off);
            off = off.checked_add(size_of(index) as u64).ok_or_else(|| {
                Error::InconsistentSampleTable(format!("sample offset overflow in chunk {chunk}"))
            })?;
            index += 1;
        }
    }

    // 4. presentation timestamps from ctts (PTS = DTS without it)
    let composition = match tables.ctts {
        Some(ctts) => Some(expand_composition_runs(ctts, count)?),
        None => None,
    };

    // 5 + 6. sync flags and frame classification
    let sync_set: Option<HashSet<u32>> = tables
        .stss
        .map(|s| s.sample_numbers.iter().copied().collect());
    let sdtp = usable_sdtp(tables.sdtp, count);

    let mut samples = Vec::with_capacity(count);
    let mut max_seen_pts = i64::MIN;
    for i in 0..count {
        // the cast is safe: expand_time_runs caps the DTS span at i64::MAX
        let pts = match &composition {
            Some(offsets) => (dts[i] as i64)
                .checked_add(offsets[i] as i64)
                .ok_or_else(|| {
                    Error::InconsistentSampleTable(format!(
                        "presentation timestamp overflow at sample {i}"
                    ))
                })?,
            None => dts[i] as i64,
        };
        // stss absent means no dependency info: every sample is sync
        let is_sync = match &sync_set {
            Some(set) => set.contains(&(i as u32 + 1)),
            None => true,
        };

        let frame_type = classify(
            sdtp.map(|entries| entries[i]),
            sync_set.is_some(),
            is_sync,
            composition.is_some(),
            pts,
            max_seen_pts,
        );
        max_seen_pts = max_seen_pts.max(pts);

        samples.push(Sample {
            index: i as u32,
            offset: offsets[i],
            size: size_of(i),
            dts: dts[i],
            pts,
            duration: durations[i],
            is_sync,
            frame_type,
        });
    }

    Ok(samples)
}

/// Expand `stsc` runs into one sample count per chunk, validating the
/// total against the declared sample count.
fn expand_chunk_runs(stsc: &StscBox, chunk_count: usize, sample_count: usize) -> Result<Vec<u32>> {
    if stsc.entries.is_empty() {
        return Err(Error::InconsistentSampleTable("empty stsc table".into()));
    }
    if stsc.entries[0].first_chunk != 1 {
        return Err(Error::InconsistentSampleTable(format!(
            "first stsc run starts at chunk {}, expected 1",
            stsc.entries[0].first_chunk
        )));
    }

    let mut per_chunk = Vec::with_capacity(chunk_count);
    for (i, entry) in stsc.entries.iter().enumerate() {
        let run_end = match stsc.entries.get(i + 1) {
            Some(next) if next.first_chunk <= entry.first_chunk => {
                return Err(Error::InconsistentSampleTable(format!(
                    "stsc first_chunk not increasing at entry {}",
                    i + 1
                )));
            }
            Some(next) => (next.first_chunk - 1) as usize,
            None => chunk_count,
        };
        if run_end > chunk_count {
            return Err(Error::InconsistentSampleTable(format!(
                "stsc run extends to chunk {run_end} but only {chunk_count} chunk offsets exist"
            )));
        }
        for _ in (entry.first_chunk - 1) as usize..run_end {
            per_chunk.push(entry.samples_per_chunk);
        }
    }

    let total: u64 = per_chunk.iter().map(|&n| n as u64).sum();
    if total != sample_count as u64 {
        return Err(Error::InconsistentSampleTable(format!(
            "stsc x stco imply {total} samples, stsz declares {sample_count}"
        )));
    }
    Ok(per_chunk)
}

/// Expand `stts` runs into cumulative DTS values plus per-sample deltas.
///
/// The whole-table span is bounded to `i64::MAX` up front, so every
/// resulting DTS converts to a presentation timestamp without wrapping.
fn expand_time_runs(stts: &SttsBox, sample_count: usize) -> Result<(Vec<u64>, Vec<u32>)> {
    let total: u64 = stts.entries.iter().map(|e| e.sample_count as u64).sum();
    if total != sample_count as u64 {
        return Err(Error::InconsistentSampleTable(format!(
            "stts covers {total} samples, stsz declares {sample_count}"
        )));
    }

    let mut span: u64 = 0;
    for entry in &stts.entries {
        let run = entry.sample_count as u64 * entry.sample_delta as u64;
        span = span
            .checked_add(run)
            .filter(|&s| s <= i64::MAX as u64)
            .ok_or_else(|| {
                Error::InconsistentSampleTable(
                    "decode timeline exceeds the representable timestamp range".into(),
                )
            })?;
    }

    let mut dts = Vec::with_capacity(sample_count);
    let mut durations = Vec::with_capacity(sample_count);
    let mut t: u64 = 0;
    for entry in &stts.entries {
        for _ in 0..entry.sample_count {
            dts.push(t);
            durations.push(entry.sample_delta);
            t = t.checked_add(entry.sample_delta as u64).ok_or_else(|| {
                Error::InconsistentSampleTable("decode timestamp overflow".into())
            })?;
        }
    }
    Ok((dts, durations))
}

/// Expand `ctts` runs into one composition offset per sample.
fn expand_composition_runs(ctts: &CttsBox, sample_count: usize) -> Result<Vec<i32>> {
    let total: u64 = ctts.entries.iter().map(|e| e.sample_count as u64).sum();
    if total != sample_count as u64 {
        return Err(Error::InconsistentSampleTable(format!(
            "ctts covers {total} samples, stsz declares {sample_count}"
        )));
    }
    let mut offsets = Vec::with_capacity(sample_count);
    for entry in &ctts.entries {
        for _ in 0..entry.sample_count {
            offsets.push(entry.sample_offset);
        }
    }
    Ok(offsets)
}

/// `sdtp` carries no declared count; a table whose byte length does not
/// match the sample count is ignored rather than failing the track.
fn usable_sdtp<'a>(
    sdtp: Option<&'a SdtpBox>,
    sample_count: usize,
) -> Option<&'a [crate::decode::SdtpEntry]> {
    let sdtp = sdtp?;
    if sdtp.entries.len() == sample_count {
        Some(&sdtp.entries)
    } else {
        warn!(
            entries = sdtp.entries.len(),
            samples = sample_count,
            "sdtp entry count disagrees with sample count, ignoring table"
        );
        None
    }
}

/// Frame-type policy, first match wins:
/// 1. `sdtp` dependency flags when present and conclusive.
/// 2. Sync sample per `stss` -> I.
/// 3. `ctts` present and this sample's PTS is below an earlier sample's
///    PTS (reordering detected) -> B.
/// 4. Otherwise P -- or Unknown when no table gives any signal.
fn classify(
    sdtp: Option<crate::decode::SdtpEntry>,
    has_stss: bool,
    is_sync: bool,
    has_ctts: bool,
    pts: i64,
    max_seen_pts: i64,
) -> FrameType {
    if let Some(e) = sdtp {
        match e.sample_depends_on {
            2 => return FrameType::I,
            1 if e.sample_is_depended_on == 2 => return FrameType::B,
            1 => return FrameType::P,
            _ => {} // dependency unknown, fall through
        }
    }
    if !has_stss && !has_ctts {
        return FrameType::Unknown;
    }
    if has_stss && is_sync {
        return FrameType::I;
    }
    if has_ctts && pts < max_seen_pts {
        return FrameType::B;
    }
    FrameType::P
}
