//! Bind group layouts and render pipelines for compiled programs.

pub mod basic;
