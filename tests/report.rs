use mp4analyzer::report::Verbosity;
use mp4analyzer::samples::FrameType;
use serde_json::Value;

fn boxed(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(8 + payload.len());
    v.extend_from_slice(&(payload.len() as u32 + 8).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

fn full_box(typ: &[u8; 4], version: u8, flags: u32, body: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + body.len());
    payload.push(version);
    payload.extend_from_slice(&flags.to_be_bytes()[1..]);
    payload.extend_from_slice(body);
    boxed(typ, &payload)
}

fn make_ftyp() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(b"isom");
    payload.extend_from_slice(&512u32.to_be_bytes());
    payload.extend_from_slice(b"isom");
    payload.extend_from_slice(b"avc1");
    boxed(b"ftyp", &payload)
}

fn make_mvhd(timescale: u32, duration: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0; 8]); // creation + modification
    body.extend_from_slice(&timescale.to_be_bytes());
    body.extend_from_slice(&duration.to_be_bytes());
    full_box(b"mvhd", 0, 0, &body)
}

fn make_tkhd(track_id: u32, duration: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0; 8]);
    body.extend_from_slice(&track_id.to_be_bytes());
    body.extend_from_slice(&[0; 4]);
    body.extend_from_slice(&duration.to_be_bytes());
    body.extend_from_slice(&[0; 52]);
    body.extend_from_slice(&(640u32 << 16).to_be_bytes());
    body.extend_from_slice(&(360u32 << 16).to_be_bytes());
    full_box(b"tkhd", 0, 7, &body)
}

fn make_mdhd(timescale: u32, duration: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0; 8]);
    body.extend_from_slice(&timescale.to_be_bytes());
    body.extend_from_slice(&duration.to_be_bytes());
    body.extend_from_slice(&0x55C4u16.to_be_bytes()); // "und"
    body.extend_from_slice(&[0; 2]);
    full_box(b"mdhd", 0, 0, &body)
}

fn make_hdlr(handler: &[u8; 4], name: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0; 4]);
    body.extend_from_slice(handler);
    body.extend_from_slice(&[0; 12]);
    body.extend_from_slice(name.as_bytes());
    body.push(0);
    full_box(b"hdlr", 0, 0, &body)
}

fn make_avcc() -> Vec<u8> {
    boxed(
        b"avcC",
        &[
            1, 0x64, 0x00, 0x1F, // version, profile, compat, level
            0xFF, 0xE1, // 4-byte NAL lengths, 1 SPS
            0x00, 0x02, 0x67, 0x42,
            0x01, // 1 PPS
            0x00, 0x02, 0x68, 0xCE,
        ],
    )
}

fn make_avc1_entry() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&[0; 6]);
    payload.extend_from_slice(&1u16.to_be_bytes()); // data_reference_index
    payload.extend_from_slice(&[0; 16]);
    payload.extend_from_slice(&640u16.to_be_bytes());
    payload.extend_from_slice(&360u16.to_be_bytes());
    payload.extend_from_slice(&[0; 12]);
    payload.extend_from_slice(&1u16.to_be_bytes()); // frame_count
    payload.extend_from_slice(&[0; 32]); // compressor name
    payload.extend_from_slice(&24u16.to_be_bytes()); // depth
    payload.extend_from_slice(&0xFFFFu16.to_be_bytes());
    payload.extend_from_slice(&make_avcc());
    boxed(b"avc1", &payload)
}

fn entry_table(entry_count: u32, values: &[u32]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&entry_count.to_be_bytes());
    for value in values {
        v.extend_from_slice(&value.to_be_bytes());
    }
    v
}

/// Sample tables for three video samples in one chunk: I at 1000 bytes,
/// P at 2000, B at 1500, one second each at timescale 1000.
fn make_video_stbl(chunk_offset: u32) -> Vec<u8> {
    let stsd = {
        let mut body = Vec::new();
        body.extend_from_slice(&1u32.to_be_bytes());
        body.extend_from_slice(&make_avc1_entry());
        full_box(b"stsd", 0, 0, &body)
    };
    let stts = full_box(b"stts", 0, 0, &entry_table(1, &[3, 1000]));
    let stss = full_box(b"stss", 0, 0, &entry_table(1, &[1]));
    let ctts = {
        let mut body = Vec::new();
        body.extend_from_slice(&3u32.to_be_bytes());
        for (count, offset) in [(1u32, 0i32), (1, 2000), (1, -1000)] {
            body.extend_from_slice(&count.to_be_bytes());
            body.extend_from_slice(&offset.to_be_bytes());
        }
        full_box(b"ctts", 1, 0, &body)
    };
    let stsc = full_box(b"stsc", 0, 0, &entry_table(1, &[1, 3, 1]));
    let stsz = {
        let mut body = Vec::new();
        body.extend_from_slice(&0u32.to_be_bytes());
        body.extend_from_slice(&3u32.to_be_bytes());
        for size in [1000u32, 2000, 1500] {
            body.extend_from_slice(&size.to_be_bytes());
        }
        full_box(b"stsz", 0, 0, &body)
    };
    let stco = full_box(b"stco", 0, 0, &entry_table(1, &[chunk_offset]));

    boxed(
        b"stbl",
        &[stsd, stts, stss, ctts, stsc, stsz, stco].concat(),
    )
}

fn make_video_trak(stbl: Vec<u8>) -> Vec<u8> {
    let vmhd = full_box(b"vmhd", 0, 1, &[0; 8]);
    let dref = {
        let url = full_box(b"url ", 0, 1, &[]);
        let mut body = Vec::new();
        body.extend_from_slice(&1u32.to_be_bytes());
        body.extend_from_slice(&url);
        full_box(b"dref", 0, 0, &body)
    };
    let dinf = boxed(b"dinf", &dref);
    let minf = boxed(b"minf", &[vmhd, dinf, stbl].concat());
    let mdia = boxed(
        b"mdia",
        &[make_mdhd(1000, 3000), make_hdlr(b"vide", "VideoHandler"), minf].concat(),
    );
    boxed(b"trak", &[make_tkhd(1, 3000), mdia].concat())
}

/// ftyp + mdat + moov, three video samples stored in the mdat.
fn make_video_file() -> Vec<u8> {
    let ftyp = make_ftyp();
    let mdat = boxed(b"mdat", &vec![0u8; 4500]);
    let chunk_offset = (ftyp.len() + 8) as u32;

    let trak = make_video_trak(make_video_stbl(chunk_offset));
    let moov = boxed(b"moov", &[make_mvhd(1000, 3000), trak].concat());

    [ftyp, mdat, moov].concat()
}

#[test]
fn movie_samples_end_to_end() {
    let data = make_video_file();
    let movie = mp4analyzer::parse(&data).expect("parse failed");

    assert_eq!(movie.tracks.len(), 1);
    let track = &movie.tracks[0];
    assert_eq!(track.track_id, 1);
    assert_eq!(track.handler_type, "vide");
    assert_eq!(track.timescale, 1000);
    assert_eq!(track.width, Some(640));
    assert_eq!(track.height, Some(360));
    assert_eq!(track.codec.codec_string(), "avc1.64001F");
    assert_eq!(track.sample_table_error, None);

    assert_eq!(track.samples.len(), 3);
    assert_eq!(
        track.samples.iter().map(|s| s.offset).collect::<Vec<_>>(),
        vec![32, 1032, 3032]
    );
    assert_eq!(
        track.samples.iter().map(|s| s.dts).collect::<Vec<_>>(),
        vec![0, 1000, 2000]
    );
    assert_eq!(
        track.samples.iter().map(|s| s.pts).collect::<Vec<_>>(),
        vec![0, 3000, 1000]
    );
    assert_eq!(
        track.samples.iter().map(|s| s.frame_type).collect::<Vec<_>>(),
        vec![FrameType::I, FrameType::P, FrameType::B]
    );
}

#[test]
fn summary_report_json_shape() {
    let data = make_video_file();
    let report = mp4analyzer::report(&data, Verbosity::Summary).expect("report failed");
    let v: Value = serde_json::to_value(&report).expect("serialize failed");

    assert_eq!(v["file"]["size_bytes"], data.len() as u64);
    assert_eq!(v["file"]["major_brand"], "isom");
    assert_eq!(v["file"]["timescale"], 1000);
    assert_eq!(v["file"]["duration_seconds"], 3.0);
    assert_eq!(v["file"]["track_count"], 1);
    assert_eq!(
        v["file"]["bitrate_bps"],
        (data.len() as f64 * 8.0 / 3.0) as u64
    );

    let t = &v["tracks"][0];
    assert_eq!(t["track_id"], 1);
    assert_eq!(t["kind"], "video");
    assert_eq!(t["codec"], "avc1.64001F");
    assert_eq!(t["width"], 640);
    assert_eq!(t["height"], 360);
    assert_eq!(t["language"], "und");
    assert_eq!(t["sample_count"], 3);
    assert_eq!(t["sync_sample_count"], 1);
    assert_eq!(t["duration_seconds"], 3.0);
    assert_eq!(t["frame_types"]["i"], 1);
    assert_eq!(t["frame_types"]["p"], 1);
    assert_eq!(t["frame_types"]["b"], 1);
    assert_eq!(t["frame_types"]["unknown"], 0);
    // 4500 payload bytes over 3 seconds
    assert_eq!(t["bitrate_bps"], 12000);

    // summary carries no box tree
    assert!(v.get("boxes").is_none());
}

#[test]
fn detailed_report_includes_box_tree() {
    let data = make_video_file();
    let report = mp4analyzer::report(&data, Verbosity::Detailed).expect("report failed");
    let v: Value = serde_json::to_value(&report).expect("serialize failed");

    let boxes = v["boxes"].as_array().expect("boxes missing");
    assert_eq!(boxes.len(), 3);
    assert_eq!(boxes[0]["type"], "ftyp");
    assert_eq!(boxes[1]["type"], "mdat");
    assert_eq!(boxes[2]["type"], "moov");
    assert_eq!(boxes[2]["full_name"], "Movie Box");

    let trak = &boxes[2]["children"][1];
    assert_eq!(trak["type"], "trak");
    let mdia = &trak["children"][1];
    assert_eq!(mdia["type"], "mdia");
    let minf = &mdia["children"][2];
    assert_eq!(minf["type"], "minf");
    let stbl = &minf["children"][2];
    assert_eq!(stbl["type"], "stbl");

    let stbl_types: Vec<&str> = stbl["children"]
        .as_array()
        .expect("stbl children missing")
        .iter()
        .map(|b| b["type"].as_str().unwrap())
        .collect();
    assert_eq!(
        stbl_types,
        vec!["stsd", "stts", "stss", "ctts", "stsc", "stsz", "stco"]
    );

    // the avc1 sample entry carries its avcC child
    let avc1 = &stbl["children"][0]["children"][0];
    assert_eq!(avc1["type"], "avc1");
    assert_eq!(avc1["children"][0]["type"], "avcC");
}

#[test]
fn inconsistent_track_is_isolated() {
    // second track declares 3 samples but its stts only covers 2
    let broken_stbl = {
        let stsd = {
            let mut body = Vec::new();
            body.extend_from_slice(&0u32.to_be_bytes());
            full_box(b"stsd", 0, 0, &body)
        };
        let stts = full_box(b"stts", 0, 0, &entry_table(1, &[2, 100]));
        let stsc = full_box(b"stsc", 0, 0, &entry_table(1, &[1, 3, 1]));
        let stsz = {
            let mut body = Vec::new();
            body.extend_from_slice(&100u32.to_be_bytes());
            body.extend_from_slice(&3u32.to_be_bytes());
            full_box(b"stsz", 0, 0, &body)
        };
        let stco = full_box(b"stco", 0, 0, &entry_table(1, &[0]));
        boxed(b"stbl", &[stsd, stts, stsc, stsz, stco].concat())
    };
    let broken_trak = {
        let smhd = full_box(b"smhd", 0, 0, &[0; 4]);
        let minf = boxed(b"minf", &[smhd, broken_stbl].concat());
        let mdia = boxed(
            b"mdia",
            &[make_mdhd(1000, 300), make_hdlr(b"soun", "SoundHandler"), minf].concat(),
        );
        boxed(b"trak", &[make_tkhd(2, 300), mdia].concat())
    };

    let ftyp = make_ftyp();
    let mdat = boxed(b"mdat", &vec![0u8; 4500]);
    let chunk_offset = (ftyp.len() + 8) as u32;
    let good_trak = make_video_trak(make_video_stbl(chunk_offset));
    let moov = boxed(
        b"moov",
        &[make_mvhd(1000, 3000), good_trak, broken_trak].concat(),
    );
    let data = [ftyp, mdat, moov].concat();

    let report = mp4analyzer::report(&data, Verbosity::Summary).expect("report failed");
    assert_eq!(report.tracks.len(), 2);

    let good = &report.tracks[0];
    assert_eq!(good.sample_count, 3);
    assert!(good.error.is_none());

    let bad = &report.tracks[1];
    assert_eq!(bad.track_id, 2);
    assert_eq!(bad.sample_count, 0);
    let err = bad.error.as_deref().expect("error marker missing");
    assert!(err.contains("inconsistent sample table"), "{err}");
}

#[test]
fn malformed_box_surfaces_as_marker() {
    // second top-level box declares a size smaller than its own header
    let mut data = make_ftyp();
    data.extend_from_slice(&4u32.to_be_bytes());
    data.extend_from_slice(b"free");
    data.extend_from_slice(&[0; 8]);

    let report = mp4analyzer::report(&data, Verbosity::Detailed).expect("report failed");
    let v: Value = serde_json::to_value(&report).expect("serialize failed");

    let boxes = v["boxes"].as_array().expect("boxes missing");
    assert_eq!(boxes.len(), 2);
    assert!(boxes[1]["fields"]["malformed"].is_string());
}

#[test]
fn iods_detected_anywhere_in_the_tree() {
    // iods buried under udta rather than sitting directly in moov
    let iods = boxed(b"iods", &[0x10, 0x01, 0x02]);
    let udta = boxed(b"udta", &iods);
    let moov = boxed(b"moov", &[make_mvhd(1000, 1000), udta].concat());
    let data = [make_ftyp(), moov].concat();

    let report = mp4analyzer::report(&data, Verbosity::Summary).expect("report failed");
    assert!(report.file.has_iods);
}

#[test]
fn zero_duration_file_has_no_bitrate() {
    let moov = boxed(b"moov", &make_mvhd(1000, 0));
    let data = [make_ftyp(), moov].concat();

    let report = mp4analyzer::report(&data, Verbosity::Summary).expect("report failed");
    let v: Value = serde_json::to_value(&report).expect("serialize failed");

    assert_eq!(v["file"]["track_count"], 0);
    assert_eq!(v["file"]["has_iods"], false);
    assert!(v["file"].get("duration_seconds").is_none());
    assert!(v["file"].get("bitrate_bps").is_none());
}
