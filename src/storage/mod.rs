// Storage layer (local JSON archive of saved research)

pub mod archive;

pub use archive::*;
