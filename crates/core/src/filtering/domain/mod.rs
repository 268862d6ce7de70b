pub mod fade_window;
pub mod filter_composer;
pub mod resolution_target;
pub mod transpose_mode;
