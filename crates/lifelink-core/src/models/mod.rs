//! Domain models for the LifeLink matching engine.

mod blood;
mod donor;
mod location;
mod matching;
mod patient;
mod request;

pub use blood::*;
pub use donor::*;
pub use location::*;
pub use matching::*;
pub use patient::*;
pub use request::*;
