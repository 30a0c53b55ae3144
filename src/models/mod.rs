//! Data models

mod filter;
mod group;
mod report;
mod settings;
mod status;
mod sustainability;
mod webhook;

pub use filter::*;
pub use group::*;
pub use report::*;
pub use settings::*;
pub use status::*;
pub use sustainability::*;
pub use webhook::*;
