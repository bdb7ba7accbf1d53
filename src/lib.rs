pub mod api;
pub mod boxes;
pub mod cursor;
pub mod decode;
pub mod descriptors;
pub mod error;
pub mod info;
pub mod known_boxes;
pub mod parser;
pub mod report;
pub mod samples;
pub mod track;

pub use api::{Movie, parse, report};
pub use boxes::{BoxFields, FourCC, Mp4Box};
pub use descriptors::CodecConfig;
pub use error::Error;
pub use report::{Report, Verbosity};
pub use samples::{FrameType, Sample};
pub use track::Track;
