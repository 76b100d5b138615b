mod embeds;
mod pagination;

pub use embeds::*;
pub use pagination::*;
