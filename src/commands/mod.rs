mod pack;

pub use pack::*;
