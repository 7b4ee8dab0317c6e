//! Podfile Patcher: rewrites the `post_install` hook of a CocoaPods Podfile
//!
//! The first `post_install do |installer|` ... `end` section of the Podfile is
//! swapped for a fixed block that keeps Flutter's per-target build settings,
//! strips `-GCC_WARN_INHIBIT_ALL_WARNINGS` from BoringSSL-GRPC and pins every
//! pod to iOS 12.0. Everything outside that section is preserved byte for byte.
//!
//! # Safety
//!
//! - The file is read in full before anything is written
//! - The replaced span is verified against the located text
//! - Atomic file writes (tempfile + fsync + rename)
//! - Re-running on a patched Podfile is a no-op
//!
//! # Example
//!
//! ```no_run
//! use podfile_patcher::{Patcher, PatchResult};
//!
//! let patcher = Patcher::new("ios/Podfile")?;
//! match patcher.apply()? {
//!     PatchResult::Applied { file } => println!("patched {}", file.display()),
//!     PatchResult::AlreadyApplied { .. } => println!("nothing to do"),
//! }
//! # Ok::<(), podfile_patcher::PatchError>(())
//! ```

pub mod edit;
pub mod patcher;
pub mod section;
pub mod template;

// Re-exports
pub use edit::{Edit, EditError, EditResult, EditVerification};
pub use patcher::{PatchError, PatchResult, Patcher, Preview, DEFAULT_PODFILE_PATH};
pub use section::{SectionLocator, SectionMatch};
pub use template::replacement_block;
