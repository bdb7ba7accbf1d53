use crate::boxes::FourCC;

/// Typed view over the box types this crate understands.
///
/// Anything not in this list becomes `KnownBox::Unknown(fourcc)` and is
/// kept as an opaque leaf; an unknown type never fails a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownBox {
    // File-level / top-level
    Ftyp,
    Moov,
    Mdat,
    Free,
    Iods,

    // moov children
    Mvhd,
    Trak,
    Mvex,
    Udta,

    // trak children
    Tkhd,
    Edts,
    Mdia,

    // edts children
    Elst,

    // mdia children
    Mdhd,
    Hdlr,
    Minf,

    // minf children
    Vmhd,
    Smhd,
    Dinf,
    Stbl,

    // dinf children
    Dref,
    Url,

    // stbl children
    Stsd,
    Stts,
    Ctts,
    Stsc,
    Stsz,
    Stco,
    Co64,
    Stss,
    Sdtp,
    Sgpd,
    Sbgp,

    // sample entries and their extension boxes
    Avc1,
    Avcc,
    Colr,
    Pasp,
    Mp4a,
    Esds,

    // Raw UUID/vendor
    Uuid,

    // Anything else
    Unknown(FourCC),
}

impl From<FourCC> for KnownBox {
    fn from(cc: FourCC) -> Self {
        match &cc.0 {
            b"ftyp" => KnownBox::Ftyp,
            b"moov" => KnownBox::Moov,
            b"mdat" => KnownBox::Mdat,
            b"free" => KnownBox::Free,
            b"iods" => KnownBox::Iods,

            b"mvhd" => KnownBox::Mvhd,
            b"trak" => KnownBox::Trak,
            b"mvex" => KnownBox::Mvex,
            b"udta" => KnownBox::Udta,

            b"tkhd" => KnownBox::Tkhd,
            b"edts" => KnownBox::Edts,
            b"mdia" => KnownBox::Mdia,

            b"elst" => KnownBox::Elst,

            b"mdhd" => KnownBox::Mdhd,
            b"hdlr" => KnownBox::Hdlr,
            b"minf" => KnownBox::Minf,

            b"vmhd" => KnownBox::Vmhd,
            b"smhd" => KnownBox::Smhd,
            b"dinf" => KnownBox::Dinf,
            b"stbl" => KnownBox::Stbl,

            b"dref" => KnownBox::Dref,
            b"url " => KnownBox::Url,

            b"stsd" => KnownBox::Stsd,
            b"stts" => KnownBox::Stts,
            b"ctts" => KnownBox::Ctts,
            b"stsc" => KnownBox::Stsc,
            b"stsz" => KnownBox::Stsz,
            b"stco" => KnownBox::Stco,
            b"co64" => KnownBox::Co64,
            b"stss" => KnownBox::Stss,
            b"sdtp" => KnownBox::Sdtp,
            b"sgpd" => KnownBox::Sgpd,
            b"sbgp" => KnownBox::Sbgp,

            b"avc1" => KnownBox::Avc1,
            b"avcC" => KnownBox::Avcc,
            b"colr" => KnownBox::Colr,
            b"pasp" => KnownBox::Pasp,
            b"mp4a" => KnownBox::Mp4a,
            b"esds" => KnownBox::Esds,

            b"uuid" => KnownBox::Uuid,

            _ => KnownBox::Unknown(cc),
        }
    }
}

impl KnownBox {
    /// Does this box *contain* child boxes (pure container semantics)?
    ///
    /// `stsd`, `dref` and the sample entries also hold children, but
    /// behind decoded fields; the tree builder special-cases those.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            KnownBox::Moov
                | KnownBox::Trak
                | KnownBox::Mdia
                | KnownBox::Minf
                | KnownBox::Stbl
                | KnownBox::Dinf
                | KnownBox::Edts
                | KnownBox::Udta
                | KnownBox::Mvex
        )
    }

    /// Human-readable box name for reports.
    pub fn full_name(&self) -> &'static str {
        match self {
            KnownBox::Ftyp => "File Type Box",
            KnownBox::Moov => "Movie Box",
            KnownBox::Mdat => "Media Data Box",
            KnownBox::Free => "Free Space Box",
            KnownBox::Iods => "Object Descriptor Box",
            KnownBox::Mvhd => "Movie Header Box",
            KnownBox::Trak => "Track Box",
            KnownBox::Mvex => "Movie Extends Box",
            KnownBox::Udta => "User Data Box",
            KnownBox::Tkhd => "Track Header Box",
            KnownBox::Edts => "Edit Box",
            KnownBox::Mdia => "Media Box",
            KnownBox::Elst => "Edit List Box",
            KnownBox::Mdhd => "Media Header Box",
            KnownBox::Hdlr => "Handler Reference Box",
            KnownBox::Minf => "Media Information Box",
            KnownBox::Vmhd => "Video Media Header Box",
            KnownBox::Smhd => "Sound Media Header Box",
            KnownBox::Dinf => "Data Information Box",
            KnownBox::Stbl => "Sample Table Box",
            KnownBox::Dref => "Data Reference Box",
            KnownBox::Url => "Data Entry URL Box",
            KnownBox::Stsd => "Sample Description Box",
            KnownBox::Stts => "Decoding Time to Sample Box",
            KnownBox::Ctts => "Composition Time to Sample Box",
            KnownBox::Stsc => "Sample to Chunk Box",
            KnownBox::Stsz => "Sample Size Box",
            KnownBox::Stco => "Chunk Offset Box",
            KnownBox::Co64 => "64-bit Chunk Offset Box",
            KnownBox::Stss => "Sync Sample Box",
            KnownBox::Sdtp => "Sample Dependency Type Box",
            KnownBox::Sgpd => "Sample Group Description Box",
            KnownBox::Sbgp => "Sample to Group Box",
            KnownBox::Avc1 => "AVC Sample Entry",
            KnownBox::Avcc => "AVC Configuration Box",
            KnownBox::Colr => "Colour Information Box",
            KnownBox::Pasp => "Pixel Aspect Ratio Box",
            KnownBox::Mp4a => "MP4 Audio Sample Entry",
            KnownBox::Esds => "Elementary Stream Descriptor Box",
            KnownBox::Uuid => "UUID Box",
            KnownBox::Unknown(_) => "Unknown Box",
        }
    }
}
