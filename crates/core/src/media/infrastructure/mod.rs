pub mod exiftool_metadata_store;
pub mod ffmpeg_cli_encoder;
#[cfg(feature = "libav")]
mod libav_probe;
