pub mod auth;
pub mod checkout;
pub mod listings;
pub mod orders;
pub mod profiles;
