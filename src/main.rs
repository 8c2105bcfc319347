//! # Voxel World Entry Point
//!
//! Runs the headless simulation driver.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- world.json
//! ```

fn main() {
    voxel_world::run();
}
