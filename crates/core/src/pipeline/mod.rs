pub mod transform_logger;
pub mod transform_videos_use_case;
