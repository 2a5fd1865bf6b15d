pub mod analysis;
pub mod returns;
