pub mod constants;
pub mod errors;
pub mod time_math;
pub mod transform_request;
pub mod video_metadata;
