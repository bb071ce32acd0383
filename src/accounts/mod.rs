//! Account store
//!
//! User accounts live in memory and are persisted as one JSON file that is
//! rewritten on every registration.

mod store;
mod types;

pub use store::{AccountStore, StoreError};
pub use types::{NewAccount, PublicUser, UserAccount};
