//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, health, host, passes, payments, places, security};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PassHub API",
        version = "0.1.0",
        description = "Event pass booking, refund and entry validation REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Places
        places::list_places,
        places::get_place,
        places::availability,
        // Host
        host::list_my_places,
        host::create_place,
        host::update_place,
        host::delete_place,
        host::capacity_status,
        host::update_capacity,
        host::assign_security,
        host::place_bookings,
        // Passes
        passes::request_pass,
        passes::my_passes,
        passes::get_pass,
        passes::refund_quote,
        passes::cancel_pass,
        // Payments
        payments::get_payment,
        payments::confirm_payment,
        payments::fail_payment,
        // Security
        security::assigned_places,
        security::scan_pass,
        // Admin
        admin::list_users,
        admin::update_role,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::RegisterUser,
            crate::models::user::UpdateRole,
            crate::models::enums::Role,
            super::PaginatedUsers,
            // Places
            crate::models::place::Place,
            crate::models::place::CreatePlace,
            crate::models::place::UpdatePlace,
            crate::models::place::UpdateCapacity,
            crate::models::place::AssignSecurity,
            crate::policy::RefundPolicy,
            crate::policy::DayAvailability,
            super::PaginatedPlaces,
            // Bookings and passes
            crate::models::booking::Booking,
            crate::models::booking::BookingDetails,
            crate::models::booking::PassRequest,
            crate::models::enums::BookingStatus,
            crate::models::pass::Pass,
            crate::models::pass::PassWithPlace,
            crate::models::pass::CancelResponse,
            crate::models::enums::PassStatus,
            crate::policy::RefundQuote,
            // Payments
            crate::models::payment::Payment,
            crate::models::payment::ConfirmPayment,
            crate::models::payment::FailPayment,
            crate::models::enums::PaymentStatus,
            // Security
            crate::models::pass::ScanRequest,
            crate::models::pass::ScanResponse,
            crate::policy::ScanVerdict,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and login"),
        (name = "places", description = "Public place catalogue"),
        (name = "host", description = "Place management for hosts"),
        (name = "passes", description = "Visitor bookings, passes and refunds"),
        (name = "payments", description = "Payment settlement"),
        (name = "security", description = "Entry scanning"),
        (name = "admin", description = "User administration")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
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

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
