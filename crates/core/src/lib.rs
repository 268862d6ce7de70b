pub mod filtering;
pub mod matching;
pub mod media;
pub mod pipeline;
pub mod planning;
pub mod shared;
