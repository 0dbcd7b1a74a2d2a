//! Intensifies
//!
//! Turns a still image into a short looping GIF that wobbles, jitters and
//! zooms, then squeezes it under a byte budget with increasingly lossy
//! re-compression.
//! This library exposes modules for integration testing.

pub mod error;
pub mod models;
pub mod rendering;
pub mod services;
