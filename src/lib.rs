#![cfg_attr(feature = "bench", feature(test))]

#[cfg(feature = "bench")]
extern crate test;

pub mod core;
pub mod terrain;
pub(crate) mod camera;

#[cfg(feature = "debug")]
pub(crate) mod debug;
