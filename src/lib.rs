//! # shadow-grader
//!
//! Shadow-DOM-aware element indexing and batch grade entry for the D2L
//! (Brightspace) consistent-evaluation quiz view, driven over the Chrome
//! DevTools Protocol (CDP).
//!
//! The grading view buries its inputs many open shadow roots deep, where
//! `querySelector` cannot reach in one call. This crate snapshots the full
//! composed tree, assigns every element a composed selector (with a
//! `::shadow` sentinel at each boundary crossing) and a global
//! document-order position, and layers the grading operations (locating
//! problems and steps, reading and batch-writing grade inputs) on top of
//! that index.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use shadow_grader::{BrowserSession, ConnectionOptions, Grader, GraderConfig};
//!
//! # fn main() -> shadow_grader::Result<()> {
//! // Attach to the Chrome instance that has the grading page open
//! let session = BrowserSession::connect(ConnectionOptions::new("ws://127.0.0.1:9222/devtools/browser/..."))?;
//! let mut grader = Grader::new(session, GraderConfig::default())?;
//!
//! // Problem 2, step 1, grade 2.5
//! grader.set_grade(2, 1, 2.5)?;
//!
//! // Or everything at once; negative values leave a step untouched
//! grader.set_grades(&[vec![3.0, -1.0, 4.0], vec![5.0]])?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Indexing model
//!
//! A snapshot is traversed pre-order and depth-first, descending into a
//! host's shadow content directly after the host itself, so the numbering
//! threads through every boundary. Each element gets an [`Entry`] with a
//! composed selector, a stable [`EntryId`], a geometry snapshot, and the
//! extent of its subtree. The index is a point-in-time value: it diverges
//! silently once the page mutates, and consumers recover by rebuilding it
//! exactly once before reporting failure.
//!
//! ## Module Overview
//!
//! - [`browser`]: browser session management (launch, or attach to the
//!   operator's logged-in Chrome via CDP)
//! - [`dom`]: snapshot extraction, shadow-aware indexing, selector
//!   resolution
//! - [`grader`]: the grading consumer (problems, steps, batch entry)
//! - [`error`]: error types and result alias

pub mod browser;
pub mod dom;
pub mod error;
pub mod grader;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use dom::{BoundingBox, DomIndex, DomTree, ElementNode, Entry, EntryId, SHADOW_SENTINEL};
pub use error::{GraderError, Result};
pub use grader::{BatchReport, Grader, GraderConfig, PageBackend};
