//! File system primitives actually exercised by drydock: atomic writes for
//! `Cartfile.resolved`/version files, and upward directory search for
//! locating a project's `Cartfile`.

pub mod atomic;
pub mod dirs;
pub mod paths;

pub use atomic::atomic_write;
pub use dirs::ensure_dir;
pub use paths::find_upwards;
