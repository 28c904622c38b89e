pub mod admin_service;
pub mod analytics_service;
pub mod auth_service;
pub mod cart_service;
pub mod category_service;
pub mod favorite_service;
pub mod invoice_service;
pub mod message_service;
pub mod order_service;
pub mod pos_service;
pub mod product_service;
pub mod review_service;
pub mod settings_service;
pub mod table_service;
