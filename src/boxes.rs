use crate::decode::{
    AudioSampleEntry, Co64Box, ColrBox, CttsBox, DrefBox, ElstBox, FtypBox, HdlrBox, MdhdBox,
    MvhdBox, PaspBox, SbgpBox, SdtpBox, SgpdBox, SmhdBox, StcoBox, StscBox, StsdBox, StssBox,
    SttsBox, StszBox, TkhdBox, UrlBox, VisualSampleEntry, VmhdBox,
};
use crate::descriptors::{AvcConfig, EsConfig};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn from_str(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() == 4 {
            Some(FourCC([b[0], b[1], b[2], b[3]]))
        } else {
            None
        }
    }
    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}
impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}
impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}
impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str_lossy())
    }
}

/// Decoded, type-specific fields of a box.
///
/// Closed union keyed by box type. Containers carry `Container`,
/// unsupported leaves carry `Opaque`, and a box whose payload failed to
/// decode carries `Malformed` with the reason; the surrounding tree is
/// unaffected either way.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxFields {
    Container,
    Opaque,
    Malformed(String),

    Ftyp(FtypBox),
    Mvhd(MvhdBox),
    Tkhd(TkhdBox),
    Mdhd(MdhdBox),
    Hdlr(HdlrBox),
    Elst(ElstBox),
    Vmhd(VmhdBox),
    Smhd(SmhdBox),
    Dref(DrefBox),
    Url(UrlBox),
    Stsd(StsdBox),
    Avc1(VisualSampleEntry),
    Mp4a(AudioSampleEntry),
    AvcC(AvcConfig),
    Esds(EsConfig),
    Colr(ColrBox),
    Pasp(PaspBox),
    Stts(SttsBox),
    Ctts(CttsBox),
    Stss(StssBox),
    Sdtp(SdtpBox),
    Stsc(StscBox),
    Stsz(StszBox),
    Stco(StcoBox),
    Co64(Co64Box),
    Sgpd(SgpdBox),
    Sbgp(SbgpBox),
}

impl BoxFields {
    pub fn is_malformed(&self) -> bool {
        matches!(self, BoxFields::Malformed(_))
    }
}

fn serialize_uuid<S: Serializer>(u: &Option<[u8; 16]>, s: S) -> Result<S::Ok, S::Error> {
    match u {
        Some(bytes) => s.serialize_some(&hex::encode(bytes)),
        None => s.serialize_none(),
    }
}

/// One node of the box tree.
///
/// Geometry invariants are enforced by the tree builder: `size >=
/// header_size`, and the box span nests inside the enclosing region.
/// The payload is addressed, not copied; slice it back out of the file
/// buffer with [`Mp4Box::payload`].
#[derive(Debug, Clone, Serialize)]
pub struct Mp4Box {
    #[serde(rename = "type")]
    pub typ: FourCC,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_uuid")]
    pub uuid: Option<[u8; 16]>,

    /// Absolute offset of the box header.
    pub start: u64,
    /// Total size including the header.
    pub size: u64,
    /// 8, 16 (large size), 24 (uuid), or 32 (large size + uuid).
    pub header_size: u64,
    /// Human-readable box name, for the report.
    pub full_name: &'static str,

    pub fields: BoxFields,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Mp4Box>,
    /// Bytes at the end of this box's payload that did not form a
    /// complete child header (containers only).
    #[serde(skip_serializing_if = "is_zero")]
    pub trailing: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl Mp4Box {
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    pub fn payload_offset(&self) -> u64 {
        self.start + self.header_size
    }

    pub fn payload_len(&self) -> u64 {
        self.size - self.header_size
    }

    /// Slice this box's payload back out of the file buffer.
    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        let start = self.payload_offset() as usize;
        let end = self.end() as usize;
        &data[start.min(data.len())..end.min(data.len())]
    }

    /// First direct child of the given type.
    pub fn child(&self, typ: &[u8; 4]) -> Option<&Mp4Box> {
        self.children.iter().find(|c| &c.typ.0 == typ)
    }

    /// First descendant reached by a path of box types.
    pub fn descend(&self, path: &[&[u8; 4]]) -> Option<&Mp4Box> {
        let mut node = self;
        for typ in path {
            node = node.child(typ)?;
        }
        Some(node)
    }
}
