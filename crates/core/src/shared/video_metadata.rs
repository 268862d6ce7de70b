/// What the encoder's probe reports about a media file.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    /// Pixel count of the shorter frame edge (`720` for 1280x720 and 720x1280).
    pub fn short_edge(&self) -> u32 {
        self.width.min(self.height)
    }
}
