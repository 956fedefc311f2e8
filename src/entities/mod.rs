pub mod qr_code;
pub mod shop_session;

pub use qr_code::Entity as QrCode;
pub use shop_session::Entity as ShopSession;
