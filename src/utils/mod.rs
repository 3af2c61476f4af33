pub mod interner;
pub mod io;

pub use interner::StringInterner;
