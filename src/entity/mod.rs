pub mod audit_logs;
pub mod listing_images;
pub mod listings;
pub mod orders;
pub mod reviews;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use listing_images::Entity as ListingImages;
pub use listings::Entity as Listings;
pub use orders::Entity as Orders;
pub use reviews::Entity as Reviews;
pub use users::Entity as Users;
