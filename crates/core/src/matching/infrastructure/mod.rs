pub mod walkdir_image_scanner;
