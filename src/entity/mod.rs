pub mod cart_items;
pub mod categories;
pub mod dining_tables;
pub mod favorites;
pub mod invoices;
pub mod messages;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod settings;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use dining_tables::Entity as DiningTables;
pub use favorites::Entity as Favorites;
pub use invoices::Entity as Invoices;
pub use messages::Entity as Messages;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use settings::Entity as Settings;
pub use users::Entity as Users;
