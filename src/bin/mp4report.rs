use anyhow::Context;
use clap::Parser;
use mp4analyzer::report::{Report, Verbosity};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Analyze an MP4 file's box tree and sample tables")]
struct Args {
    /// MP4/ISOBMFF file path
    path: PathBuf,

    /// Include the full decoded box tree in the report
    #[arg(long)]
    detailed: bool,

    /// Output as JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let data = std::fs::read(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;

    let verbosity = if args.detailed {
        Verbosity::Detailed
    } else {
        Verbosity::Summary
    };
    let report = mp4analyzer::report(&data, verbosity)
        .with_context(|| format!("analyzing {}", args.path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human(&args.path, &report);
    }

    Ok(())
}

// ---- human-readable output -----------------------------------------

fn print_human(path: &std::path::Path, report: &Report) {
    println!("File: {}", path.display());
    println!("Size: {} bytes", report.file.size_bytes);
    if let Some(major) = &report.file.major_brand {
        println!("Major brand: {}", major);
    }
    if !report.file.compatible_brands.is_empty() {
        println!(
            "Compatible brands: {}",
            report.file.compatible_brands.join(", ")
        );
    }
    if let Some(dur) = report.file.duration_seconds {
        println!("Duration: {:.3} s", dur);
    }
    if let Some(bps) = report.file.bitrate_bps {
        println!("Bitrate: {:.1} kbps", bps as f64 / 1000.0);
    }
    if report.trailing_bytes > 0 {
        println!("Trailing bytes: {}", report.trailing_bytes);
    }

    if report.tracks.is_empty() {
        println!("Tracks: (none)");
    } else {
        println!("Tracks:");
        for t in &report.tracks {
            println!("  Track {} ({}):", t.track_id, t.kind);
            println!("    codec: {}", t.codec);
            if let (Some(w), Some(h)) = (t.width, t.height) {
                println!("    size: {}x{}", w, h);
            }
            if let (Some(ch), Some(rate)) = (t.channel_count, t.audio_sample_rate) {
                println!("    audio: {} ch @ {} Hz", ch, rate);
            }
            println!("    timescale: {}", t.timescale);
            if let Some(dur) = t.duration_seconds {
                println!("    duration: {:.3} s", dur);
            }
            println!(
                "    samples: {} ({} sync)",
                t.sample_count, t.sync_sample_count
            );
            let ft = &t.frame_types;
            if t.sample_count > 0 {
                println!(
                    "    frames: {} I / {} P / {} B / {} unknown",
                    ft.i, ft.p, ft.b, ft.unknown
                );
            }
            if let Some(bps) = t.bitrate_bps {
                println!("    bitrate: {:.1} kbps", bps as f64 / 1000.0);
            }
            if let Some(lang) = &t.language {
                println!("    language: {}", lang);
            }
            if let Some(err) = &t.error {
                println!("    SAMPLE TABLE ERROR: {}", err);
            }
        }
    }

    if let Some(boxes) = &report.boxes {
        println!("Box structure:");
        for b in boxes {
            print_box(b, 1);
        }
    }
}

fn print_box(b: &mp4analyzer::Mp4Box, indent: usize) {
    let marker = match &b.fields {
        mp4analyzer::BoxFields::Malformed(reason) => format!("  [malformed: {}]", reason),
        mp4analyzer::BoxFields::Opaque => "  [opaque]".to_string(),
        _ => String::new(),
    };
    println!(
        "{}{} (size={}, offset={}){}",
        "  ".repeat(indent),
        b.typ,
        b.size,
        b.start,
        marker
    );
    for child in &b.children {
        print_box(child, indent + 1);
    }
}
