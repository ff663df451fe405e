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
    dto::{
        addresses, auth as auth_dto,
        cart::{CartDetail, CartItemDetail},
        coupons::{CouponList, CreateCouponRequest, ExtendCouponRequest},
        favorites::FavoriteProductList,
        orders::{CheckoutData, CheckoutRequest, OrderList, OrderWithItems},
        payments::{CreatePaymentRequest, PaymentWithLink},
        products,
    },
    models::{
        Cart, CartItem, Coupon, Favorite, Order, OrderItem, Payment, PaymentMethod, Product,
        ShippingAddress, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        addresses as address_routes, admin, auth, cart, coupons, favorites, health, orders, params,
        payments, products as product_routes,
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
        product_routes::list_products,
        product_routes::create_product,
        product_routes::get_product,
        product_routes::update_product,
        product_routes::delete_product,
        favorites::add_favorite,
        favorites::remove_favorite,
        favorites::list_favorites,
        cart::create_cart,
        cart::get_cart,
        cart::update_cart,
        cart::delete_cart,
        cart::add_cart_item,
        cart::get_cart_item,
        cart::update_cart_item,
        cart::remove_cart_item,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        orders::get_order_item,
        orders::update_order_item,
        orders::delete_order_item,
        coupons::list_coupons,
        coupons::create_coupon,
        coupons::extend_coupon,
        coupons::deactivate_coupon,
        payments::create_payment,
        payments::get_payment,
        address_routes::create_address,
        address_routes::get_address,
        address_routes::update_address,
        address_routes::delete_address,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory
    ),
    components(
        schemas(
            User,
            Product,
            Favorite,
            Cart,
            CartItem,
            Order,
            OrderItem,
            Payment,
            Coupon,
            ShippingAddress,
            PaymentMethod,
            auth_dto::RegisterRequest,
            auth_dto::LoginRequest,
            auth_dto::LoginResponse,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            products::ProductList,
            FavoriteProductList,
            CartDetail,
            CartItemDetail,
            CheckoutRequest,
            CheckoutData,
            OrderList,
            OrderWithItems,
            CouponList,
            CreateCouponRequest,
            ExtendCouponRequest,
            CreatePaymentRequest,
            PaymentWithLink,
            addresses::CreateAddressRequest,
            addresses::UpdateAddressRequest,
            admin::ProductList,
            admin::UpdateOrderStatusRequest,
            admin::InventoryAdjustRequest,
            admin::LowStockQuery,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<products::ProductList>,
            ApiResponse<CartDetail>,
            ApiResponse<CheckoutData>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CouponList>,
            ApiResponse<PaymentWithLink>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Cart", description = "Cart and cart item endpoints"),
        (name = "Orders", description = "Checkout and order endpoints"),
        (name = "Coupons", description = "Coupon endpoints"),
        (name = "Payments", description = "Payment endpoints"),
        (name = "Addresses", description = "Shipping address endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
