pub mod analytics;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod favorites;
pub mod invoices;
pub mod messages;
pub mod orders;
pub mod pos;
pub mod products;
pub mod reviews;
pub mod settings;
pub mod tables;
