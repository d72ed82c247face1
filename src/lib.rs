//! # downsize
//!
//! Brings oversized JPEG and PNG files down to a byte budget, in place,
//! without changing their format and without resampling them below a minimum
//! width.
//!
//! # Architecture: Enumerate, Try, Commit
//!
//! Every file over budget goes through the same four steps:
//!
//! ```text
//! 1. Enumerate   size + width + family  →  CandidatePlan   (pure, no pixels)
//! 2. Search      CandidatePlan          →  accepted trial  (in memory only)
//! 3. Back up     photo.jpg              →  photo.jpg.backup (once, ever)
//! 4. Commit      accepted bytes         →  photo.jpg       (atomic rename)
//! ```
//!
//! The search is a greedy walk over a small grid of (scale, setting) pairs and
//! takes the first trial that fits. When nothing fits, a deterministic
//! fallback at the width floor and the lowest setting is used instead, so
//! every readable image ends up with a usable file.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`ladder`] | Candidate enumeration: size-tiered scale ladders filtered by the width floor |
//! | [`trial`] | Trial evaluation: resample, normalize color, encode to memory |
//! | [`search`] | Greedy early-exit search with a deterministic fallback |
//! | [`safety`] | Backup-once and atomic commit file primitives |
//! | [`process`] | Per-file pipeline and the parallel batch runner |
//! | [`family`] | Per-family behavior (JPEG vs PNG) behind the `FamilyProfile` trait |
//! | [`policy`] | The immutable per-run `CompressionPolicy` |
//! | [`config`] | `downsize.toml` loading, validation, and merging |
//! | [`types`] | Shared types: `FormatFamily`, `Candidate`, `CompressionOutcome` |
//! | [`imaging`] | Codec/resize backend trait and the pure-Rust implementation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## First Fit, Not Best Fit
//!
//! The walk stops at the first trial under the ceiling. Ladders are ordered so
//! that the first fit is also the least degraded one the ladder offers; a
//! best-fit search would only trade more encodes for a smaller file nobody
//! asked for.
//!
//! ## The Accepted Bytes Are the Written Bytes
//!
//! Trials encode into memory and the winning buffer is written as-is. There is
//! no second encode at commit time, so the size measured during the search is
//! exactly the size on disk.
//!
//! ## Backend Trait
//!
//! All pixel work goes through [`imaging::ImageBackend`]. Production uses the
//! pure-Rust `image` crate; tests use a recording mock whose encoded sizes
//! come from a formula, so search behavior can be tested exactly without
//! encoding a single pixel.
//!
//! ## Backups Are Never Overwritten
//!
//! The backup is created with exclusive creation. Running the tool twice on
//! the same file keeps the very first original, not the output of the first
//! run.

pub mod config;
pub mod family;
pub mod imaging;
pub mod ladder;
pub mod output;
pub mod policy;
pub mod process;
pub mod safety;
pub mod search;
pub mod trial;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
