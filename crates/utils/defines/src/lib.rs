#![no_std]

pub mod config;
pub mod error;
pub mod misc;
pub mod resource;
pub mod signal;
