mod ffmpeg_processor;

pub use ffmpeg_processor::{check_ffmpeg_binary, FfmpegProcessor};
