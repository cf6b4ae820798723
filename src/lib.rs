//! Novidades patcher: one-shot content patch for the Novidades modal
//!
//! Rewrites `src/components/NovidadesModal.tsx` in a front-end project:
//! the `const novidades = [...]` list is replaced with the current news
//! entries and the title markup becomes a link when an entry has one.
//!
//! # Architecture
//!
//! Rules are data ([`config`], embedded from `patches/novidades.toml`).
//! Each rule locates its span (regex or exact block) and compiles down to a
//! verified byte-span [`Edit`]. The [`Patcher`] applies every rule in memory
//! and writes the file once.
//!
//! # Safety
//!
//! - Every rule must match exactly its expected number of times
//! - Nothing is written unless every rule succeeded
//! - Atomic file writes (tempfile + fsync + rename)
//! - Project root boundary enforcement
//!
//! Re-running against an already patched file fails on purpose: the old
//! markup block no longer exists.
//!
//! # Example
//!
//! ```no_run
//! use novidades_patcher::Patcher;
//!
//! let patcher = Patcher::new(".")?;
//! let outcome = patcher.run()?;
//! println!("{outcome}");
//! # Ok::<(), novidades_patcher::PatchError>(())
//! ```

pub mod config;
pub mod edit;
pub mod patcher;
pub mod rule;
pub mod safety;

// Re-exports
pub use config::{load_embedded, load_from_path, load_from_str, ConfigError, PatchConfig};
pub use edit::{Edit, EditError, EditVerification};
pub use patcher::{PatchError, PatchOutcome, Patcher};
pub use rule::{Matcher, ReplacementRule};
pub use safety::{SafetyError, WorkspaceGuard};
