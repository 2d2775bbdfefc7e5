//! The operation layer: one file per directory-service verb, each composing
//! the DN model, path codec, entry file I/O, and tree enumerator under the
//! backend's concurrency gate.

pub(crate) mod add;
mod bind;
mod delete;
mod get_entry;
mod modify;
mod referral;
mod rename;
mod search;

pub use add::add;
pub use bind::bind;
pub use delete::delete;
pub use get_entry::get_entry;
pub use modify::{modify, Mod};
pub use referral::referral_probe;
pub use rename::rename;
pub use search::search;
