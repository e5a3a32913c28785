//! Local text embedding via fastembed.

pub mod embedder;
