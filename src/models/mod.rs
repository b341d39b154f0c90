mod company;
mod snapshot;

pub use company::*;
pub use snapshot::*;
