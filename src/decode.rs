use crate::boxes::BoxFields;
use crate::cursor::ByteCursor;
use crate::descriptors;
use crate::error::{Error, Result};
use crate::known_boxes::KnownBox;
use serde::Serialize;

/// File Type Box data
#[derive(Debug, Clone, Serialize)]
pub struct FtypBox {
    pub major_brand: String,
    pub minor_version: u32,
    pub compatible_brands: Vec<String>,
}

/// Movie Header Box data
#[derive(Debug, Clone, Serialize)]
pub struct MvhdBox {
    pub version: u8,
    pub flags: u32,
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
}

/// Track Header Box data
#[derive(Debug, Clone, Serialize)]
pub struct TkhdBox {
    pub version: u8,
    pub flags: u32,
    pub track_id: u32,
    pub duration: u64,
    /// 16.16 fixed point in the file; absent when the payload stops short.
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Media Header Box data
#[derive(Debug, Clone, Serialize)]
pub struct MdhdBox {
    pub version: u8,
    pub flags: u32,
    pub timescale: u32,
    pub duration: u64,
    pub language: String,
}

/// Handler Reference Box data
#[derive(Debug, Clone, Serialize)]
pub struct HdlrBox {
    pub version: u8,
    pub flags: u32,
    pub handler_type: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElstEntry {
    pub segment_duration: u64,
    pub media_time: i64,
    pub media_rate_integer: i16,
    pub media_rate_fraction: i16,
}

/// Edit List Box data
#[derive(Debug, Clone, Serialize)]
pub struct ElstBox {
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<ElstEntry>,
}

/// Video Media Header Box data
#[derive(Debug, Clone, Serialize)]
pub struct VmhdBox {
    pub version: u8,
    pub flags: u32,
    pub graphics_mode: u16,
    pub opcolor: [u16; 3],
}

/// Sound Media Header Box data
#[derive(Debug, Clone, Serialize)]
pub struct SmhdBox {
    pub version: u8,
    pub flags: u32,
    pub balance: i16,
}

/// Data Reference Box header (entries are child boxes)
#[derive(Debug, Clone, Serialize)]
pub struct DrefBox {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
}

/// Data Entry URL Box data
#[derive(Debug, Clone, Serialize)]
pub struct UrlBox {
    pub version: u8,
    pub flags: u32,
    pub self_contained: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Sample Description Box header (sample entries are child boxes)
#[derive(Debug, Clone, Serialize)]
pub struct StsdBox {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
}

/// Visual sample entry fields (`avc1`); extension boxes (`avcC`,
/// `colr`, `pasp`) follow as children.
#[derive(Debug, Clone, Serialize)]
pub struct VisualSampleEntry {
    pub data_reference_index: u16,
    pub width: u16,
    pub height: u16,
    pub frame_count: u16,
    pub compressor: String,
    pub depth: u16,
}

/// Audio sample entry fields (`mp4a`); `esds` follows as a child.
#[derive(Debug, Clone, Serialize)]
pub struct AudioSampleEntry {
    pub data_reference_index: u16,
    pub channel_count: u16,
    pub sample_size: u16,
    /// Integer part of the 16.16 fixed-point rate.
    pub sample_rate: u32,
}

/// Colour Information Box data
#[derive(Debug, Clone, Serialize)]
pub struct ColrBox {
    pub colour_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour_primaries: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_characteristics: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix_coefficients: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_range: Option<bool>,
}

/// Pixel Aspect Ratio Box data
#[derive(Debug, Clone, Serialize)]
pub struct PaspBox {
    pub h_spacing: u32,
    pub v_spacing: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SttsEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

/// Decoding Time-to-Sample Box data
#[derive(Debug, Clone, Serialize)]
pub struct SttsBox {
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<SttsEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CttsEntry {
    pub sample_count: u32,
    /// Signed in version 1; real files use negative offsets either way.
    pub sample_offset: i32,
}

/// Composition Time-to-Sample Box data
#[derive(Debug, Clone, Serialize)]
pub struct CttsBox {
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<CttsEntry>,
}

/// Sync Sample Box data
#[derive(Debug, Clone, Serialize)]
pub struct StssBox {
    pub version: u8,
    pub flags: u32,
    /// 1-based sample numbers.
    pub sample_numbers: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SdtpEntry {
    pub is_leading: u8,
    pub sample_depends_on: u8,
    pub sample_is_depended_on: u8,
    pub sample_has_redundancy: u8,
}

/// Sample Dependency Type Box data (one entry per sample)
#[derive(Debug, Clone, Serialize)]
pub struct SdtpBox {
    pub version: u8,
    pub flags: u32,
    #[serde(skip_serializing)]
    pub entries: Vec<SdtpEntry>,
    pub entry_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StscEntry {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub sample_description_index: u32,
}

/// Sample-to-Chunk Box data
#[derive(Debug, Clone, Serialize)]
pub struct StscBox {
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<StscEntry>,
}

/// Sample Size Box data
#[derive(Debug, Clone, Serialize)]
pub struct StszBox {
    pub version: u8,
    pub flags: u32,
    /// Non-zero means every sample has this size and the table is absent.
    pub sample_size: u32,
    pub sample_count: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sample_sizes: Vec<u32>,
}

/// Chunk Offset Box data
#[derive(Debug, Clone, Serialize)]
pub struct StcoBox {
    pub version: u8,
    pub flags: u32,
    pub chunk_offsets: Vec<u32>,
}

/// 64-bit Chunk Offset Box data
#[derive(Debug, Clone, Serialize)]
pub struct Co64Box {
    pub version: u8,
    pub flags: u32,
    pub chunk_offsets: Vec<u64>,
}

/// Sample Group Description Box data (descriptions kept opaque)
#[derive(Debug, Clone, Serialize)]
pub struct SgpdBox {
    pub version: u8,
    pub flags: u32,
    pub grouping_type: String,
    pub entry_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SbgpEntry {
    pub sample_count: u32,
    pub group_description_index: u32,
}

/// Sample-to-Group Box data
#[derive(Debug, Clone, Serialize)]
pub struct SbgpBox {
    pub version: u8,
    pub flags: u32,
    pub grouping_type: String,
    pub entries: Vec<SbgpEntry>,
}

/// Guard a declared table entry count against the remaining payload.
/// A count that would read past the payload end fails the box before
/// any allocation happens.
fn check_entry_span(cur: &ByteCursor<'_>, count: u32, stride: usize, what: &str) -> Result<()> {
    let need = (count as usize).checked_mul(stride);
    match need {
        Some(n) if n <= cur.remaining() => Ok(()),
        _ => Err(Error::MalformedBox(format!(
            "{what} declares {count} entries but only {} payload bytes remain",
            cur.remaining()
        ))),
    }
}

/// Decode the payload of a supported leaf box into its typed fields.
///
/// Pure over the payload bytes. Returns `Malformed`/`Unsupported`
/// errors for the caller to downgrade; never panics on bad input.
pub fn decode_payload(kind: KnownBox, payload: &[u8]) -> Result<BoxFields> {
    let mut cur = ByteCursor::new(payload);
    match kind {
        KnownBox::Ftyp => decode_ftyp(&mut cur).map(BoxFields::Ftyp),
        KnownBox::Mvhd => decode_mvhd(&mut cur).map(BoxFields::Mvhd),
        KnownBox::Tkhd => decode_tkhd(&mut cur).map(BoxFields::Tkhd),
        KnownBox::Mdhd => decode_mdhd(&mut cur).map(BoxFields::Mdhd),
        KnownBox::Hdlr => decode_hdlr(&mut cur).map(BoxFields::Hdlr),
        KnownBox::Elst => decode_elst(&mut cur).map(BoxFields::Elst),
        KnownBox::Vmhd => decode_vmhd(&mut cur).map(BoxFields::Vmhd),
        KnownBox::Smhd => decode_smhd(&mut cur).map(BoxFields::Smhd),
        KnownBox::Url => decode_url(&mut cur).map(BoxFields::Url),
        KnownBox::Colr => decode_colr(&mut cur).map(BoxFields::Colr),
        KnownBox::Pasp => decode_pasp(&mut cur).map(BoxFields::Pasp),
        KnownBox::Stts => decode_stts(&mut cur).map(BoxFields::Stts),
        KnownBox::Ctts => decode_ctts(&mut cur).map(BoxFields::Ctts),
        KnownBox::Stss => decode_stss(&mut cur).map(BoxFields::Stss),
        KnownBox::Sdtp => decode_sdtp(&mut cur).map(BoxFields::Sdtp),
        KnownBox::Stsc => decode_stsc(&mut cur).map(BoxFields::Stsc),
        KnownBox::Stsz => decode_stsz(&mut cur).map(BoxFields::Stsz),
        KnownBox::Stco => decode_stco(&mut cur).map(BoxFields::Stco),
        KnownBox::Co64 => decode_co64(&mut cur).map(BoxFields::Co64),
        KnownBox::Sgpd => decode_sgpd(&mut cur).map(BoxFields::Sgpd),
        KnownBox::Sbgp => decode_sbgp(&mut cur).map(BoxFields::Sbgp),
        KnownBox::Avcc => descriptors::parse_avc_config(payload).map(BoxFields::AvcC),
        KnownBox::Esds => decode_esds(&mut cur).map(BoxFields::Esds),
        // mdat, free, iods and everything unknown stay opaque
        _ => Ok(BoxFields::Opaque),
    }
}

/// Decode the full-box prefix of `stsd` / `dref`; their entries follow
/// as child boxes parsed by the tree builder.
pub fn decode_entry_list_header(kind: KnownBox, payload: &[u8]) -> Result<BoxFields> {
    let mut cur = ByteCursor::new(payload);
    let (version, flags) = cur.read_version_flags()?;
    let entry_count = cur.read_u32()?;
    match kind {
        KnownBox::Stsd => Ok(BoxFields::Stsd(StsdBox {
            version,
            flags,
            entry_count,
        })),
        KnownBox::Dref => Ok(BoxFields::Dref(DrefBox {
            version,
            flags,
            entry_count,
        })),
        _ => Err(Error::MalformedBox(format!(
            "{kind:?} is not an entry-list box"
        ))),
    }
}

/// Byte length of the `stsd` entry-list prefix (version/flags + count).
pub const ENTRY_LIST_HEADER_LEN: u64 = 8;

/// Decode the fixed fields of a sample entry, returning the fields and
/// the offset where its extension child boxes begin.
pub fn decode_sample_entry(kind: KnownBox, payload: &[u8]) -> Result<(BoxFields, u64)> {
    let mut cur = ByteCursor::new(payload);
    match kind {
        KnownBox::Avc1 => {
            let fields = decode_visual_entry(&mut cur)?;
            Ok((BoxFields::Avc1(fields), cur.position() as u64))
        }
        KnownBox::Mp4a => {
            let fields = decode_audio_entry(&mut cur)?;
            Ok((BoxFields::Mp4a(fields), cur.position() as u64))
        }
        _ => Err(Error::MalformedBox(format!(
            "{kind:?} is not a sample entry"
        ))),
    }
}

fn decode_ftyp(cur: &mut ByteCursor<'_>) -> Result<FtypBox> {
    let major = cur.read_fourcc()?;
    let minor_version = cur.read_u32()?;
    let mut compatible_brands = Vec::new();
    while cur.remaining() >= 4 {
        let brand = cur.read_fourcc()?;
        compatible_brands.push(String::from_utf8_lossy(&brand).to_string());
    }
    Ok(FtypBox {
        major_brand: String::from_utf8_lossy(&major).to_string(),
        minor_version,
        compatible_brands,
    })
}

fn decode_mvhd(cur: &mut ByteCursor<'_>) -> Result<MvhdBox> {
    let (version, flags) = cur.read_version_flags()?;
    let (creation_time, modification_time, timescale, duration) = if version == 1 {
        let c = cur.read_u64()?;
        let m = cur.read_u64()?;
        let ts = cur.read_u32()?;
        let d = cur.read_u64()?;
        (c, m, ts, d)
    } else {
        let c = cur.read_u32()? as u64;
        let m = cur.read_u32()? as u64;
        let ts = cur.read_u32()?;
        let d = cur.read_u32()? as u64;
        (c, m, ts, d)
    };
    Ok(MvhdBox {
        version,
        flags,
        creation_time,
        modification_time,
        timescale,
        duration,
    })
}

fn decode_tkhd(cur: &mut ByteCursor<'_>) -> Result<TkhdBox> {
    let (version, flags) = cur.read_version_flags()?;
    let (track_id, duration) = if version == 1 {
        cur.skip(16)?; // creation + modification
        let id = cur.read_u32()?;
        cur.skip(4)?; // reserved
        (id, cur.read_u64()?)
    } else {
        cur.skip(8)?;
        let id = cur.read_u32()?;
        cur.skip(4)?;
        (id, cur.read_u32()? as u64)
    };

    // reserved[2], layer, alternate_group, volume, reserved, matrix
    let (width, height) = if cur.remaining() >= 8 + 8 + 36 + 8 {
        cur.skip(8 + 8 + 36)?;
        let w = cur.read_u32()? as f64 / 65536.0;
        let h = cur.read_u32()? as f64 / 65536.0;
        (Some(w), Some(h))
    } else {
        (None, None)
    };

    Ok(TkhdBox {
        version,
        flags,
        track_id,
        duration,
        width,
        height,
    })
}

fn lang_from_u16(code: u16) -> String {
    if code == 0 {
        return "und".to_string();
    }
    let c1 = ((code >> 10) & 0x1F) as u8 + 0x60;
    let c2 = ((code >> 5) & 0x1F) as u8 + 0x60;
    let c3 = (code & 0x1F) as u8 + 0x60;
    format!("{}{}{}", c1 as char, c2 as char, c3 as char)
}

fn decode_mdhd(cur: &mut ByteCursor<'_>) -> Result<MdhdBox> {
    let (version, flags) = cur.read_version_flags()?;
    let (timescale, duration) = if version == 1 {
        cur.skip(16)?;
        let ts = cur.read_u32()?;
        (ts, cur.read_u64()?)
    } else {
        cur.skip(8)?;
        let ts = cur.read_u32()?;
        (ts, cur.read_u32()? as u64)
    };
    let language = lang_from_u16(cur.read_u16()?);
    Ok(MdhdBox {
        version,
        flags,
        timescale,
        duration,
        language,
    })
}

fn decode_hdlr(cur: &mut ByteCursor<'_>) -> Result<HdlrBox> {
    let (version, flags) = cur.read_version_flags()?;
    cur.skip(4)?; // pre_defined
    let handler = cur.read_fourcc()?;
    cur.skip(12)?; // reserved[3]
    let mut name_bytes = cur.rest().to_vec();
    while name_bytes.last() == Some(&0) {
        name_bytes.pop();
    }
    Ok(HdlrBox {
        version,
        flags,
        handler_type: String::from_utf8_lossy(&handler).to_string(),
        name: String::from_utf8_lossy(&name_bytes).to_string(),
    })
}

fn decode_elst(cur: &mut ByteCursor<'_>) -> Result<ElstBox> {
    let (version, flags) = cur.read_version_flags()?;
    let entry_count = cur.read_u32()?;
    let stride = if version == 1 { 20 } else { 12 };
    check_entry_span(cur, entry_count, stride, "elst")?;
    let mut entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        let (segment_duration, media_time) = if version == 1 {
            (cur.read_u64()?, cur.read_i64()?)
        } else {
            (cur.read_u32()? as u64, cur.read_i32()? as i64)
        };
        entries.push(ElstEntry {
            segment_duration,
            media_time,
            media_rate_integer: cur.read_i16()?,
            media_rate_fraction: cur.read_i16()?,
        });
    }
    Ok(ElstBox {
        version,
        flags,
        entries,
    })
}

fn decode_vmhd(cur: &mut ByteCursor<'_>) -> Result<VmhdBox> {
    let (version, flags) = cur.read_version_flags()?;
    let graphics_mode = cur.read_u16()?;
    let opcolor = [cur.read_u16()?, cur.read_u16()?, cur.read_u16()?];
    Ok(VmhdBox {
        version,
        flags,
        graphics_mode,
        opcolor,
    })
}

fn decode_smhd(cur: &mut ByteCursor<'_>) -> Result<SmhdBox> {
    let (version, flags) = cur.read_version_flags()?;
    let balance = cur.read_i16()?;
    Ok(SmhdBox {
        version,
        flags,
        balance,
    })
}

fn decode_url(cur: &mut ByteCursor<'_>) -> Result<UrlBox> {
    let (version, flags) = cur.read_version_flags()?;
    let self_contained = flags & 1 == 1;
    let rest = cur.rest();
    let location = if rest.is_empty() {
        None
    } else {
        let trimmed = rest.strip_suffix(&[0]).unwrap_or(rest);
        Some(String::from_utf8_lossy(trimmed).to_string())
    };
    Ok(UrlBox {
        version,
        flags,
        self_contained,
        location,
    })
}

fn decode_colr(cur: &mut ByteCursor<'_>) -> Result<ColrBox> {
    let colour_type = cur.read_fourcc()?;
    let mut colr = ColrBox {
        colour_type: String::from_utf8_lossy(&colour_type).to_string(),
        colour_primaries: None,
        transfer_characteristics: None,
        matrix_coefficients: None,
        full_range: None,
    };
    // nclx (ISO) and nclc (QuickTime) share the three parameter fields;
    // only nclx carries the full-range bit.
    if &colour_type == b"nclx" || &colour_type == b"nclc" {
        colr.colour_primaries = Some(cur.read_u16()?);
        colr.transfer_characteristics = Some(cur.read_u16()?);
        colr.matrix_coefficients = Some(cur.read_u16()?);
        if &colour_type == b"nclx" {
            colr.full_range = Some(cur.read_u8()? & 0x80 != 0);
        }
    }
    Ok(colr)
}

fn decode_pasp(cur: &mut ByteCursor<'_>) -> Result<PaspBox> {
    Ok(PaspBox {
        h_spacing: cur.read_u32()?,
        v_spacing: cur.read_u32()?,
    })
}

fn decode_stts(cur: &mut ByteCursor<'_>) -> Result<SttsBox> {
    let (version, flags) = cur.read_version_flags()?;
    let entry_count = cur.read_u32()?;
    check_entry_span(cur, entry_count, 8, "stts")?;
    let mut entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        entries.push(SttsEntry {
            sample_count: cur.read_u32()?,
            sample_delta: cur.read_u32()?,
        });
    }
    Ok(SttsBox {
        version,
        flags,
        entries,
    })
}

fn decode_ctts(cur: &mut ByteCursor<'_>) -> Result<CttsBox> {
    let (version, flags) = cur.read_version_flags()?;
    let entry_count = cur.read_u32()?;
    check_entry_span(cur, entry_count, 8, "ctts")?;
    let mut entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        entries.push(CttsEntry {
            sample_count: cur.read_u32()?,
            sample_offset: cur.read_i32()?,
        });
    }
    Ok(CttsBox {
        version,
        flags,
        entries,
    })
}

fn decode_stss(cur: &mut ByteCursor<'_>) -> Result<StssBox> {
    let (version, flags) = cur.read_version_flags()?;
    let entry_count = cur.read_u32()?;
    check_entry_span(cur, entry_count, 4, "stss")?;
    let mut sample_numbers = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        sample_numbers.push(cur.read_u32()?);
    }
    Ok(StssBox {
        version,
        flags,
        sample_numbers,
    })
}

fn decode_sdtp(cur: &mut ByteCursor<'_>) -> Result<SdtpBox> {
    let (version, flags) = cur.read_version_flags()?;
    // one byte per sample; the sample count lives in stsz
    let entries: Vec<SdtpEntry> = cur
        .rest()
        .iter()
        .map(|&b| SdtpEntry {
            is_leading: (b >> 6) & 0x3,
            sample_depends_on: (b >> 4) & 0x3,
            sample_is_depended_on: (b >> 2) & 0x3,
            sample_has_redundancy: b & 0x3,
        })
        .collect();
    let entry_count = entries.len() as u32;
    Ok(SdtpBox {
        version,
        flags,
        entries,
        entry_count,
    })
}

fn decode_stsc(cur: &mut ByteCursor<'_>) -> Result<StscBox> {
    let (version, flags) = cur.read_version_flags()?;
    let entry_count = cur.read_u32()?;
    check_entry_span(cur, entry_count, 12, "stsc")?;
    let mut entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        entries.push(StscEntry {
            first_chunk: cur.read_u32()?,
            samples_per_chunk: cur.read_u32()?,
            sample_description_index: cur.read_u32()?,
        });
    }
    Ok(StscBox {
        version,
        flags,
        entries,
    })
}

fn decode_stsz(cur: &mut ByteCursor<'_>) -> Result<StszBox> {
    let (version, flags) = cur.read_version_flags()?;
    let sample_size = cur.read_u32()?;
    let sample_count = cur.read_u32()?;
    let mut sample_sizes = Vec::new();
    if sample_size == 0 {
        check_entry_span(cur, sample_count, 4, "stsz")?;
        sample_sizes.reserve(sample_count as usize);
        for _ in 0..sample_count {
            sample_sizes.push(cur.read_u32()?);
        }
    }
    Ok(StszBox {
        version,
        flags,
        sample_size,
        sample_count,
        sample_sizes,
    })
}

fn decode_stco(cur: &mut ByteCursor<'_>) -> Result<StcoBox> {
    let (version, flags) = cur.read_version_flags()?;
    let entry_count = cur.read_u32()?;
    check_entry_span(cur, entry_count, 4, "stco")?;
    let mut chunk_offsets = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        chunk_offsets.push(cur.read_u32()?);
    }
    Ok(StcoBox {
        version,
        flags,
        chunk_offsets,
    })
}

fn decode_co64(cur: &mut ByteCursor<'_>) -> Result<Co64Box> {
    let (version, flags) = cur.read_version_flags()?;
    let entry_count = cur.read_u32()?;
    check_entry_span(cur, entry_count, 8, "co64")?;
    let mut chunk_offsets = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        chunk_offsets.push(cur.read_u64()?);
    }
    Ok(Co64Box {
        version,
        flags,
        chunk_offsets,
    })
}

fn decode_sgpd(cur: &mut ByteCursor<'_>) -> Result<SgpdBox> {
    let (version, flags) = cur.read_version_flags()?;
    let grouping_type = cur.read_fourcc()?;
    if version == 1 {
        cur.skip(4)?; // default_length
    } else if version >= 2 {
        cur.skip(4)?; // default_sample_description_index
    }
    let entry_count = cur.read_u32()?;
    Ok(SgpdBox {
        version,
        flags,
        grouping_type: String::from_utf8_lossy(&grouping_type).to_string(),
        entry_count,
    })
}

fn decode_sbgp(cur: &mut ByteCursor<'_>) -> Result<SbgpBox> {
    let (version, flags) = cur.read_version_flags()?;
    let grouping_type = cur.read_fourcc()?;
    if version == 1 {
        cur.skip(4)?; // grouping_type_parameter
    }
    let entry_count = cur.read_u32()?;
    check_entry_span(cur, entry_count, 8, "sbgp")?;
    let mut entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        entries.push(SbgpEntry {
            sample_count: cur.read_u32()?,
            group_description_index: cur.read_u32()?,
        });
    }
    Ok(SbgpBox {
        version,
        flags,
        grouping_type: String::from_utf8_lossy(&grouping_type).to_string(),
        entries,
    })
}

fn decode_esds(cur: &mut ByteCursor<'_>) -> Result<crate::descriptors::EsConfig> {
    let (_version, _flags) = cur.read_version_flags()?;
    descriptors::parse_es_descriptor(cur.rest())
}

fn decode_visual_entry(cur: &mut ByteCursor<'_>) -> Result<VisualSampleEntry> {
    cur.skip(6)?; // reserved
    let data_reference_index = cur.read_u16()?;
    cur.skip(16)?; // pre_defined, reserved, pre_defined[3]
    let width = cur.read_u16()?;
    let height = cur.read_u16()?;
    cur.skip(12)?; // horiz/vert resolution, reserved
    let frame_count = cur.read_u16()?;
    let name = cur.read_bytes(32)?;
    let name_len = (name[0] as usize).min(31);
    let compressor = String::from_utf8_lossy(&name[1..1 + name_len]).to_string();
    let depth = cur.read_u16()?;
    cur.skip(2)?; // pre_defined
    Ok(VisualSampleEntry {
        data_reference_index,
        width,
        height,
        frame_count,
        compressor,
        depth,
    })
}

fn decode_audio_entry(cur: &mut ByteCursor<'_>) -> Result<AudioSampleEntry> {
    cur.skip(6)?; // reserved
    let data_reference_index = cur.read_u16()?;
    cur.skip(8)?; // reserved[2]
    let channel_count = cur.read_u16()?;
    let sample_size = cur.read_u16()?;
    cur.skip(4)?; // pre_defined, reserved
    let sample_rate = cur.read_u32()? >> 16;
    Ok(AudioSampleEntry {
        data_reference_index,
        channel_count,
        sample_size,
        sample_rate,
    })
}
