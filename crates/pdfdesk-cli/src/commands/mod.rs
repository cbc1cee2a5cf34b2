//! Subcommand implementations.

pub mod compress;
pub mod images;
pub mod merge;
pub mod ocr;
pub mod pages;
pub mod split;
pub mod tools;
pub mod word;
