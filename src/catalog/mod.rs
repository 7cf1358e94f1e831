pub mod client;
pub mod models;

pub use client::CatalogClient;
pub use models::{HeritageDetail, ImageItem, RawDate, RecordStub, SearchPage};
