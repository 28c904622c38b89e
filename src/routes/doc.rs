use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        analytics::{DailyRevenue, HourlyBucket, PaymentMethodRevenue, SalesSummary, TopProduct},
        pricing::Discount,
        status::{
            ItemStatus, OrderSource, OrderStatus, OrderType, PaymentMethod, PaymentStatus, Role,
            TableStatus,
        },
    },
    dto::{
        analytics::SalesReport,
        auth::{LoginRequest, LoginResponse, RegisterRequest, UpdateRoleRequest, UserList},
        cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        favorites::{AddFavoriteRequest, FavoriteProductList},
        invoices::InvoiceList,
        messages::{CreateMessageRequest, MessageList},
        orders::{
            ApplyDiscountRequest, CheckoutRequest, OrderItemInput, OrderList, OrderWithItems,
            RecordPaymentRequest, UpdateItemStatusRequest, UpdateOrderStatusRequest,
        },
        pos::{
            AddItemsRequest, CompleteOrderRequest, CompletedOrder, OpenTableOrderRequest,
            QuickCheckoutRequest, WalkInOrderRequest,
        },
        products::{CreateProductRequest, ProductList, SetAvailabilityRequest, UpdateProductRequest},
        reviews::{CreateReviewRequest, ReviewList, SetReviewVisibilityRequest},
        settings::UpdateSettingsRequest,
        tables::{
            CreateTableRequest, SetTableStatusRequest, TableDetail, TableList, UpdateTableRequest,
        },
    },
    events::{LiveEvent, Resource},
    models::{
        Category, DiningTable, Favorite, Invoice, InvoiceLine, Message, Order, OrderItem, Product,
        ProductOption, Review, Settings, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, analytics, auth, cart, categories, favorites, health, invoices, live, messages,
        orders, params, pos, products, reviews, settings, tables, users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        auth::me,
        users::list_users,
        users::update_user_role,
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::set_availability,
        products::archive_product,
        products::list_product_reviews,
        products::review_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        favorites::add_favorite,
        favorites::remove_favorite,
        favorites::list_favorites,
        orders::list_order,
        orders::checkout,
        orders::get_order,
        orders::cancel_order,
        orders::get_order_invoice,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::update_item_status,
        admin::record_payment,
        admin::apply_discount,
        tables::list_tables,
        tables::get_table,
        tables::create_table,
        tables::update_table,
        tables::delete_table,
        tables::set_table_status,
        pos::open_table_order,
        pos::add_items,
        pos::walk_in_order,
        pos::complete_order,
        pos::quick_checkout,
        invoices::list_invoices,
        invoices::get_invoice,
        analytics::sales_report,
        settings::get_settings,
        settings::update_settings,
        reviews::list_cafe_reviews,
        reviews::review_cafe,
        reviews::set_review_visibility,
        reviews::delete_review,
        messages::create_message,
        messages::list_messages,
        messages::mark_read,
        messages::delete_message,
        live::live_events
    ),
    components(
        schemas(
            User,
            Role,
            Category,
            Product,
            ProductOption,
            Favorite,
            Order,
            OrderItem,
            OrderStatus,
            ItemStatus,
            OrderType,
            OrderSource,
            PaymentMethod,
            PaymentStatus,
            DiningTable,
            TableStatus,
            Invoice,
            InvoiceLine,
            Settings,
            Review,
            Message,
            Discount,
            LiveEvent,
            Resource,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateRoleRequest,
            UserList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CreateProductRequest,
            UpdateProductRequest,
            SetAvailabilityRequest,
            ProductList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartItemDto,
            CartList,
            AddFavoriteRequest,
            FavoriteProductList,
            OrderItemInput,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            UpdateOrderStatusRequest,
            UpdateItemStatusRequest,
            RecordPaymentRequest,
            ApplyDiscountRequest,
            CreateTableRequest,
            UpdateTableRequest,
            SetTableStatusRequest,
            TableList,
            TableDetail,
            OpenTableOrderRequest,
            AddItemsRequest,
            WalkInOrderRequest,
            CompleteOrderRequest,
            QuickCheckoutRequest,
            CompletedOrder,
            InvoiceList,
            SalesReport,
            SalesSummary,
            PaymentMethodRevenue,
            DailyRevenue,
            HourlyBucket,
            TopProduct,
            UpdateSettingsRequest,
            CreateReviewRequest,
            SetReviewVisibilityRequest,
            ReviewList,
            CreateMessageRequest,
            MessageList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::InvoiceQuery,
            params::AnalyticsQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CompletedOrder>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "User administration"),
        (name = "Categories", description = "Menu categories"),
        (name = "Products", description = "Menu items with variants and modifiers"),
        (name = "Reviews", description = "Ratings for products and the café"),
        (name = "Cart", description = "Customer cart"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Orders", description = "Customer orders"),
        (name = "Admin", description = "Staff order management"),
        (name = "Tables", description = "Dining tables"),
        (name = "POS", description = "Point of sale"),
        (name = "Invoices", description = "Invoice snapshots"),
        (name = "Analytics", description = "Sales reporting"),
        (name = "Settings", description = "Café settings"),
        (name = "Messages", description = "Contact form inbox"),
        (name = "Live", description = "Server-sent events"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
