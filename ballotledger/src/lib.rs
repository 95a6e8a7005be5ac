#[macro_use]
extern crate serde;

#[macro_use]
extern crate log;

mod clock;
mod directory;
mod election;
mod error;
mod identity;
mod ledger;
mod phase;
mod registry;
mod serde_hex;
mod transaction;
mod util;

pub use clock::*;
pub use directory::*;
pub use election::*;
pub use error::*;
pub use identity::*;
pub use ledger::*;
pub use phase::*;
pub use registry::*;
pub use serde_hex::*;
pub use transaction::*;
pub use util::*;
