pub mod generate;
pub mod merge;
