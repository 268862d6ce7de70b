use std::path::Path;

use crate::shared::video_metadata::VideoMetadata;

/// Read duration and frame size through libavformat.
pub fn probe(path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;

    let ictx = ffmpeg_next::format::input(path)?;
    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or("No video stream found")?;
    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
    let decoder = codec_ctx.decoder().video()?;

    let duration = if ictx.duration() > 0 {
        ictx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
    } else {
        let tb = stream.time_base();
        stream.duration() as f64 * f64::from(tb.numerator()) / f64::from(tb.denominator().max(1))
    };

    Ok(VideoMetadata {
        duration,
        width: decoder.width(),
        height: decoder.height(),
    })
}
