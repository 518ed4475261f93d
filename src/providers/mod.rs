//! Ready-made hook providers.
mod counter;
mod table;

pub use counter::EventCounter;
pub use table::{EventMask, RedirectTable, RedirectTableBuilder};
