//! Geometry primitives for `descmap`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Pt2`, `Mat3`, ...),
//! - the homography projector ([`project_point`]) and row-major conversions,
//! - the single ground-truth resolver ([`resolve_ground_truth`]) used to decide
//!   which keypoint of view B a query of view A corresponds to,
//! - deterministic synthetic scenes for tests and examples.
//!
//! Nothing in this crate fails on degenerate geometry: a singular projection or
//! an out-of-bounds query simply resolves to "no ground truth".

/// Linear algebra type aliases.
pub mod math;
/// Homography projection and conversions.
pub mod homography;
/// Geometric ground-truth resolution (single relevant item).
pub mod ground_truth;
/// Seeded synthetic image pairs.
pub mod synthetic;

pub use ground_truth::*;
pub use homography::*;
pub use math::*;
