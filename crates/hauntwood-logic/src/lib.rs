//! Pure game rules for Hauntwood.
//!
//! This crate contains all logic that is independent of the entity table,
//! renderer, audio backend or input devices. Functions take plain data and
//! return results, making them unit-testable and reusable by the engine and
//! the headless harness alike.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`animation`] | Idle/walk/hurt sprite clips and facing |
//! | [`camera`] | Follow offsets, walking bob, decaying shake |
//! | [`constants`] | World extents, speeds, radii, event timings |
//! | [`geometry`] | Vectors, AABBs, world bounds, Catmull-Rom paths |
//! | [`movement`] | Axis-separated movement with wall-sliding, velocity smoothing |
//! | [`timers`] | Clamped countdowns and phase clocks |
//! | [`weather`] | Weather states, lighting targets, footstep selection |

pub mod animation;
pub mod camera;
pub mod constants;
pub mod geometry;
pub mod movement;
pub mod timers;
pub mod weather;
