#![allow(dead_code)]

pub mod app;
pub mod builders;
pub mod db;
pub mod mock_catalog;

pub use app::TestApp;
pub use builders::{QrCodeBuilder, SessionBuilder};
pub use db::TestDb;
pub use mock_catalog::{MockCatalog, MockProduct};
