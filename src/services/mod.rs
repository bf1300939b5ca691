pub mod auth_service;
pub mod checkout_service;
pub mod listing_service;
pub mod order_service;
pub mod profile_service;
