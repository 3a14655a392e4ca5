pub mod an;
pub mod common;
