pub mod merge;
pub mod sort;
