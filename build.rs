//! Build script for ragchat
//!
//! The chat page under `ui/` is embedded at compile time in release builds,
//! so edits to it must trigger a rebuild.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=ui/");
}
