//! QR codes for products - an admin app embedded in the merchant dashboard.
//!
//! Shop owners create QR codes that send customers to a product page or to
//! a cart holding the product. This library exposes all modules for testing
//! purposes.

pub mod catalog;
pub mod entities;
pub mod errors;
pub mod form;
pub mod qr_codes;
pub mod session;
pub mod settings;
pub mod shop_sync;
pub mod storage;
pub mod views;
pub mod web;
