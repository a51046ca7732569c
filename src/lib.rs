pub mod cli;
pub mod commands;
pub mod merge;
pub mod utils;
