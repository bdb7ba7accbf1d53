use crate::boxes::{BoxFields, FourCC, Mp4Box};
use crate::decode;
use crate::error::{Error, Result};
use crate::known_boxes::KnownBox;
use byteorder::{BigEndian, ByteOrder};
use tracing::warn;

/// A parsed box sequence plus any unparsed trailing bytes of the region.
#[derive(Debug, Clone)]
pub struct BoxTree {
    pub boxes: Vec<Mp4Box>,
    /// Bytes at the end of the stream that did not form a complete box
    /// header. Recorded, not an error.
    pub trailing: u64,
}

/// Parse the top-level box sequence of an MP4 buffer.
///
/// The only fatal condition is a buffer too short for one box header.
/// Everything else is contained: a box with an inconsistent header is
/// recorded as a malformed leaf spanning the rest of its region, and
/// siblings of its parent keep parsing.
pub fn parse_tree(data: &[u8]) -> Result<BoxTree> {
    if data.len() < 8 {
        return Err(Error::TruncatedInput(data.len()));
    }
    let (boxes, trailing) = parse_region(data, 0, data.len() as u64);
    Ok(BoxTree { boxes, trailing })
}

struct Header {
    typ: FourCC,
    uuid: Option<[u8; 16]>,
    start: u64,
    size: u64,
    header_size: u64,
}

fn read_header(data: &[u8], start: u64, region_end: u64) -> Result<Header> {
    let pos = start as usize;
    let size32 = BigEndian::read_u32(&data[pos..pos + 4]);
    let typ = FourCC([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]]);
    let mut header_size: u64 = 8;
    let mut size = size32 as u64;

    if size32 == 1 {
        if region_end - start < 16 {
            return Err(Error::MalformedBox(format!(
                "{typ} at {start}: region too short for 64-bit size"
            )));
        }
        size = BigEndian::read_u64(&data[pos + 8..pos + 16]);
        header_size += 8;
    }

    let mut uuid = None;
    if &typ.0 == b"uuid" {
        let ext_at = start + header_size;
        if region_end.saturating_sub(ext_at) < 16 {
            return Err(Error::MalformedBox(format!(
                "uuid box at {start}: region too short for extended type"
            )));
        }
        let mut u = [0u8; 16];
        u.copy_from_slice(&data[ext_at as usize..ext_at as usize + 16]);
        uuid = Some(u);
        header_size += 16;
    }

    if size32 == 0 {
        // extends to the end of the enclosing region; only legal for the
        // last box, which this assignment makes true by construction
        size = region_end - start;
    }

    if size < header_size {
        return Err(Error::MalformedBox(format!(
            "{typ} at {start}: size {size} smaller than header ({header_size})"
        )));
    }
    let end = start.checked_add(size).ok_or_else(|| {
        Error::MalformedBox(format!("{typ} at {start}: size {size} overflows"))
    })?;
    if end > region_end {
        return Err(Error::MalformedBox(format!(
            "{typ} at {start}: end {end} past enclosing region ({region_end})"
        )));
    }

    Ok(Header {
        typ,
        uuid,
        start,
        size,
        header_size,
    })
}

/// Parse all boxes between `start` and `end`. Never fails: header
/// violations become a malformed leaf covering the rest of the region.
fn parse_region(data: &[u8], start: u64, end: u64) -> (Vec<Mp4Box>, u64) {
    let mut boxes = Vec::new();
    let mut pos = start;

    while end - pos >= 8 {
        let hdr = match read_header(data, pos, end) {
            Ok(h) => h,
            Err(e) => {
                warn!(offset = pos, error = %e, "recording malformed subtree");
                boxes.push(malformed_leaf(data, pos, end, e));
                return (boxes, 0);
            }
        };
        let box_end = hdr.start + hdr.size;
        boxes.push(build_box(data, hdr));
        pos = box_end;
    }

    (boxes, end - pos)
}

fn malformed_leaf(data: &[u8], start: u64, end: u64, err: Error) -> Mp4Box {
    let pos = start as usize;
    let typ = FourCC([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]]);
    Mp4Box {
        typ,
        uuid: None,
        start,
        size: end - start,
        header_size: 8,
        full_name: KnownBox::from(typ).full_name(),
        fields: BoxFields::Malformed(err.to_string()),
        children: Vec::new(),
        trailing: 0,
    }
}

fn build_box(data: &[u8], hdr: Header) -> Mp4Box {
    let kind = if hdr.uuid.is_some() {
        KnownBox::Uuid
    } else {
        KnownBox::from(hdr.typ)
    };
    let payload_start = hdr.start + hdr.header_size;
    let payload_end = hdr.start + hdr.size;
    let payload = &data[payload_start as usize..payload_end as usize];

    let mut children = Vec::new();
    let mut trailing = 0;

    let fields = if kind.is_container() {
        let (kids, rest) = parse_region(data, payload_start, payload_end);
        children = kids;
        trailing = rest;
        BoxFields::Container
    } else if matches!(kind, KnownBox::Stsd | KnownBox::Dref) {
        // full-box prefix + entry count, then entries as child boxes
        match decode::decode_entry_list_header(kind, payload) {
            Ok(fields) => {
                let entries_at = payload_start + decode::ENTRY_LIST_HEADER_LEN;
                let (kids, rest) = parse_region(data, entries_at, payload_end);
                children = kids;
                trailing = rest;
                fields
            }
            Err(e) => downgrade(&hdr, e),
        }
    } else if matches!(kind, KnownBox::Avc1 | KnownBox::Mp4a) {
        // fixed sample-entry fields, then extension boxes as children
        match decode::decode_sample_entry(kind, payload) {
            Ok((fields, body_len)) => {
                let (kids, rest) = parse_region(data, payload_start + body_len, payload_end);
                children = kids;
                trailing = rest;
                fields
            }
            Err(e) => downgrade(&hdr, e),
        }
    } else {
        match decode::decode_payload(kind, payload) {
            Ok(fields) => fields,
            Err(e) => downgrade(&hdr, e),
        }
    };

    Mp4Box {
        typ: hdr.typ,
        uuid: hdr.uuid,
        start: hdr.start,
        size: hdr.size,
        header_size: hdr.header_size,
        full_name: kind.full_name(),
        fields,
        children,
        trailing,
    }
}

fn downgrade(hdr: &Header, err: Error) -> BoxFields {
    warn!(typ = %hdr.typ, offset = hdr.start, error = %err, "box decode failed");
    BoxFields::Malformed(err.to_string())
}
