//! Pipeline stages for analysis-result-to-Markdown rendering.
//!
//! Each submodule implements exactly one transformation step. The pure
//! renderers (paragraph, table, assemble) have no I/O; figure substitution
//! is the only stage that calls out to collaborators.
//!
//! ## Data Flow
//!
//! ```text
//!                       ┌──▶ paragraph ──┐
//! sections ──▶ linearize ──▶ table ──────┼──▶ assemble ──▶ Markdown
//!                       └──▶ figure ─────┘
//!                            (crop + summarise)
//! ```
//!
//! 1. [`linearize`] — walk every section's element references in order and
//!    dispatch each to its renderer
//! 2. [`paragraph`] — role and position → heading or body line
//! 3. [`table`]     — cells → HTML table with spans
//! 4. [`figure`]    — crop the figure region, summarise it, wrap the caption
//! 5. [`assemble`]  — join fragments; collapse the gap before tables

pub mod assemble;
pub mod figure;
pub mod linearize;
pub mod paragraph;
pub mod table;
