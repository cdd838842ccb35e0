pub mod access;
pub mod error;
pub mod helpers;
pub mod qr_code;
