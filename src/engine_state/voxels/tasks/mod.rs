//! # Voxel Task System
//!
//! This module contains tasks related to voxel world generation. They run on the
//! task manager so a burst of newly visible chunks does not stall a frame.

pub mod chunk_generation_task;
