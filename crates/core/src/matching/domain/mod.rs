pub mod candidate_scanner;
pub mod timestamp_candidate;
pub mod timestamp_matcher;
