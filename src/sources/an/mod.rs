//! The National Assembly's bill records: modern and legacy HTML pages and
//! the open-data export.

pub mod acts;
pub mod adapter;
pub mod classifier;
pub mod legacy;
pub mod opendata;
pub mod opendata_xml;
pub mod page;
pub mod stitch;
pub mod tree;

pub use adapter::Resolver;
