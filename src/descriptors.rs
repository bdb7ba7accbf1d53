//! Nested codec configuration structures: the AVC decoder
//! configuration record (`avcC`) and the MPEG-4 elementary stream
//! descriptor chain (`esds`).

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use serde::{Serialize, Serializer};

fn serialize_nal_units<S: Serializer>(
    units: &[Vec<u8>],
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.collect_seq(units.iter().map(hex::encode))
}

/// AVCDecoderConfigurationRecord fields.
#[derive(Debug, Clone, Serialize)]
pub struct AvcConfig {
    pub configuration_version: u8,
    pub avc_profile_indication: u8,
    pub profile_compatibility: u8,
    pub avc_level_indication: u8,
    /// NAL unit length prefix size in bytes (1, 2 or 4).
    pub nal_length_size: u8,
    #[serde(serialize_with = "serialize_nal_units")]
    pub sps: Vec<Vec<u8>>,
    #[serde(serialize_with = "serialize_nal_units")]
    pub pps: Vec<Vec<u8>>,
}

impl AvcConfig {
    /// RFC 6381 codec parameter string, e.g. `avc1.64001F`.
    pub fn codec_string(&self) -> String {
        format!(
            "avc1.{}",
            hex::encode_upper([
                self.avc_profile_indication,
                self.profile_compatibility,
                self.avc_level_indication,
            ])
        )
    }
}

/// Parse an `avcC` payload with explicit per-NAL length accounting.
pub fn parse_avc_config(payload: &[u8]) -> Result<AvcConfig> {
    let mut cur = ByteCursor::new(payload);
    let configuration_version = cur.read_u8()?;
    if configuration_version != 1 {
        return Err(Error::MalformedBox(format!(
            "avcC configuration version {configuration_version}, expected 1"
        )));
    }
    let avc_profile_indication = cur.read_u8()?;
    let profile_compatibility = cur.read_u8()?;
    let avc_level_indication = cur.read_u8()?;
    let nal_length_size = (cur.read_u8()? & 0x3) + 1;

    let num_sps = cur.read_u8()? & 0x1F;
    let mut sps = Vec::with_capacity(num_sps as usize);
    for _ in 0..num_sps {
        let len = cur.read_u16()? as usize;
        sps.push(cur.read_bytes(len)?.to_vec());
    }
    let num_pps = cur.read_u8()?;
    let mut pps = Vec::with_capacity(num_pps as usize);
    for _ in 0..num_pps {
        let len = cur.read_u16()? as usize;
        pps.push(cur.read_bytes(len)?.to_vec());
    }

    Ok(AvcConfig {
        configuration_version,
        avc_profile_indication,
        profile_compatibility,
        avc_level_indication,
        nal_length_size,
        sps,
        pps,
    })
}

// MPEG-4 systems descriptor tags (ISO 14496-1)
const ES_DESCR_TAG: u8 = 0x03;
const DECODER_CONFIG_TAG: u8 = 0x04;
const DECODER_SPECIFIC_TAG: u8 = 0x05;

/// MPEG-4 elementary stream configuration extracted from `esds`.
#[derive(Debug, Clone, Serialize)]
pub struct EsConfig {
    pub es_id: u16,
    pub object_type_indication: u8,
    pub stream_type: u8,
    pub buffer_size_db: u32,
    pub max_bitrate: u32,
    pub avg_bitrate: u32,
    #[serde(serialize_with = "serialize_dsi")]
    pub decoder_specific_info: Vec<u8>,
    /// First five bits of the audio DecoderSpecificInfo, when audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_object_type: Option<u8>,
}

fn serialize_dsi<S: Serializer>(dsi: &Vec<u8>, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(dsi))
}

impl EsConfig {
    /// Codec parameter string, e.g. `mp4a.40.2` or `mp4v.20`.
    pub fn codec_string(&self) -> String {
        let prefix = if self.is_audio() { "mp4a" } else { "mp4v" };
        match self.audio_object_type {
            Some(aot) => format!("{prefix}.{:02X}.{aot}", self.object_type_indication),
            None => format!("{prefix}.{:02X}", self.object_type_indication),
        }
    }

    pub fn is_audio(&self) -> bool {
        // streamType 5 = audio; OTI 0x40 = MPEG-4 AAC, 0x6b = MP3
        self.stream_type == 5 || self.object_type_indication == 0x40
    }
}

/// Read a descriptor header: tag byte plus a 1..=4 byte size with
/// high-bit continuation coding.
fn read_descriptor_header(cur: &mut ByteCursor<'_>) -> Result<(u8, usize)> {
    let tag = cur.read_u8()?;
    let mut size: usize = 0;
    for _ in 0..4 {
        let b = cur.read_u8()?;
        size = (size << 7) | (b & 0x7F) as usize;
        if b & 0x80 == 0 {
            return Ok((tag, size));
        }
    }
    Err(Error::UnsupportedDescriptor(
        "descriptor size runs past 4 continuation bytes".to_string(),
    ))
}

/// Walk the descriptor chain of an `esds` payload (after version/flags).
///
/// Explicit state machine over the cursor: read tag, read
/// continuation-coded length, read payload, advance. Descriptors other
/// than the decoder configuration are skipped by their declared length.
pub fn parse_es_descriptor(payload: &[u8]) -> Result<EsConfig> {
    let mut cur = ByteCursor::new(payload);
    let (tag, es_len) = read_descriptor_header(&mut cur)?;
    if tag != ES_DESCR_TAG {
        return Err(Error::UnsupportedDescriptor(format!(
            "expected ES descriptor tag 0x03, found 0x{tag:02x}"
        )));
    }
    if es_len > cur.remaining() {
        return Err(Error::MalformedBox(format!(
            "ES descriptor declares {es_len} bytes, {} remain",
            cur.remaining()
        )));
    }

    let es_id = cur.read_u16()?;
    let es_flags = cur.read_u8()?;
    if es_flags & 0x80 != 0 {
        cur.skip(2)?; // dependsOn_ES_ID
    }
    if es_flags & 0x40 != 0 {
        let url_len = cur.read_u8()? as usize;
        cur.skip(url_len)?;
    }
    if es_flags & 0x20 != 0 {
        cur.skip(2)?; // OCR_ES_ID
    }

    let mut config: Option<EsConfig> = None;
    while cur.remaining() > 1 {
        let (tag, len) = read_descriptor_header(&mut cur)?;
        if len > cur.remaining() {
            return Err(Error::MalformedBox(format!(
                "descriptor 0x{tag:02x} declares {len} bytes, {} remain",
                cur.remaining()
            )));
        }
        let body = cur.read_bytes(len)?;
        if tag == DECODER_CONFIG_TAG {
            config = Some(parse_decoder_config(es_id, body)?);
        }
    }

    config.ok_or_else(|| {
        Error::UnsupportedDescriptor("esds carries no DecoderConfigDescriptor".to_string())
    })
}

fn parse_decoder_config(es_id: u16, body: &[u8]) -> Result<EsConfig> {
    let mut cur = ByteCursor::new(body);
    let object_type_indication = cur.read_u8()?;
    let stream_bits = cur.read_u8()?;
    let stream_type = stream_bits >> 2;
    let buffer_size_db = cur.read_u24()?;
    let max_bitrate = cur.read_u32()?;
    let avg_bitrate = cur.read_u32()?;

    let mut decoder_specific_info = Vec::new();
    if cur.remaining() > 1 {
        let (tag, len) = read_descriptor_header(&mut cur)?;
        if tag == DECODER_SPECIFIC_TAG {
            decoder_specific_info = cur.read_bytes(len.min(cur.remaining()))?.to_vec();
        }
    }

    let audio_object_type = if object_type_indication == 0x40 && !decoder_specific_info.is_empty() {
        Some(decoder_specific_info[0] >> 3)
    } else {
        None
    };

    Ok(EsConfig {
        es_id,
        object_type_indication,
        stream_type,
        buffer_size_db,
        max_bitrate,
        avg_bitrate,
        decoder_specific_info,
        audio_object_type,
    })
}

/// Codec configuration attached to a track's sample description, in the
/// shape a downstream media decoder consumes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecConfig {
    Avc(AvcConfig),
    Mpeg4Audio(EsConfig),
    Mpeg4Video(EsConfig),
    Unknown,
}

impl CodecConfig {
    pub fn from_es(es: EsConfig) -> Self {
        if es.is_audio() {
            CodecConfig::Mpeg4Audio(es)
        } else {
            CodecConfig::Mpeg4Video(es)
        }
    }

    /// Human-readable codec parameter string; unsupported entries render
    /// as a generic marker, never an error.
    pub fn codec_string(&self) -> String {
        match self {
            CodecConfig::Avc(avc) => avc.codec_string(),
            CodecConfig::Mpeg4Audio(es) | CodecConfig::Mpeg4Video(es) => es.codec_string(),
            CodecConfig::Unknown => "unknown codec".to_string(),
        }
    }
}
