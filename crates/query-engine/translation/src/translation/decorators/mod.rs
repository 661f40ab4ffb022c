//! Optional passes for time-sliced and multi-language entities.

pub mod localization;
pub mod temporal;
