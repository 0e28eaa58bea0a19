//! # texdep-cli
//!
//! Command-line front end for the texdep pipeline. The binary is the
//! non-interactive stand-in for a graphical shell: it collects the run
//! inputs (root file, chapter selection, category selection, reduction
//! mode), drives the pipeline, and hands the serialized artifacts to
//! whatever renders them.

mod pipeline;

pub use pipeline::{
    kind_counts, list_chapters, run_pipeline, Analysis, ChapterInfo, PipelineOptions,
};
