//! # Voxel World Core
//!
//! This module contains the voxel data model and everything that produces or mutates it.
//!
//! ## Architecture
//!
//! * **Block**: the static block catalog and the per-voxel record
//! * **Noise**: seeded coherent noise and a seeded sequential generator
//! * **Chunk**: fixed-size voxel columns with dense visible-instance lists, and the
//!   multi-pass generator that fills them
//! * **EditStore**: the player edit overlay replayed on every generated chunk
//! * **World**: chunk streaming around an observer and cross-chunk edit routing
//! * **Tasks**: chunk generation work items for the task manager
//!
//! ## Data Flow
//!
//! 1. The world computes the chunks visible from the observer
//! 2. Missing chunks are queued as generation tasks
//! 3. Finished grids get edits replayed, instances culled, and are published as loaded
//! 4. Edits go through the world, write through to the edit store, and re-cull neighbors

pub mod block;
pub mod chunk;
pub mod edit_store;
pub mod seeded_noise;
pub mod tasks;
pub mod world;
