//! Save/load/push model surface for HubKit.
//!
//! This crate provides:
//! - The [`HubModel`] mixin trait: implement two artifact hooks and get
//!   `save_pretrained`, `from_pretrained`, and `push_to_hub` for free
//! - Model card generation ([`ModelCard`], [`CardData`])

#![warn(missing_docs)]

mod card;
mod mixin;

pub use card::*;
pub use mixin::*;

pub use hubkit_client::CommitInfo;
