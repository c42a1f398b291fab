//! Per-language analyzers

pub mod generic;
pub mod javascript;
pub mod php;
pub mod python;
