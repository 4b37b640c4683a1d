//! ROM catalogue subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/rom-play body
//!     → filename.rs (validate_rom_name → RomName | RejectReason)
//!     → store (append play event)
//!
//! GET /api/roms
//!     → library.rs (read_dir → structural filter → sort)
//! ```

pub mod filename;
pub mod library;

pub use filename::{
    is_structurally_valid, validate_rom_name, validate_rom_name_str, RejectReason, RomName,
    MAX_ROM_NAME_LEN,
};
pub use library::{LibraryError, RomLibrary};
