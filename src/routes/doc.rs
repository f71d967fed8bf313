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
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        bags::{BagList, CreateBagRequest, NewBagItem, SetAvailabilityRequest, UpdateBagRequest},
        cart::{AddBagRequest, CartList, PersonalizeRequest},
        reservations::{ConstraintCheck, ReservationList},
    },
    models::{Bag, BagItem, BagKind, CartEntry, Reservation, ReservationStatus, User},
    response::{ApiResponse, Meta},
    routes::{auth, bags, cart, health, params, reservations},
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
        bags::list_bags,
        bags::create_bag,
        bags::get_bag,
        bags::update_bag,
        bags::set_availability,
        bags::list_by_establishment,
        cart::cart_list,
        cart::add_bag,
        cart::remove_entry,
        cart::personalize,
        reservations::list_my_reservations,
        reservations::create_from_cart,
        reservations::check_constraint,
        reservations::cancel_reservation,
        reservations::list_for_establishment
    ),
    components(
        schemas(
            User,
            Bag,
            BagItem,
            BagKind,
            CartEntry,
            Reservation,
            ReservationStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateBagRequest,
            NewBagItem,
            UpdateBagRequest,
            SetAvailabilityRequest,
            BagList,
            AddBagRequest,
            PersonalizeRequest,
            CartList,
            ReservationList,
            ConstraintCheck,
            params::Pagination,
            params::ReservationFilter,
            params::ReservationListQuery,
            Meta,
            ApiResponse<Bag>,
            ApiResponse<BagList>,
            ApiResponse<CartEntry>,
            ApiResponse<CartList>,
            ApiResponse<ReservationList>,
            ApiResponse<ConstraintCheck>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Bags", description = "Bag publication and browsing"),
        (name = "Cart", description = "Cart entries and personalization"),
        (name = "Reservations", description = "Reservation lifecycle"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
