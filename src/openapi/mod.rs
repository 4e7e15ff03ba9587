use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::ErrorResponse;
use crate::handlers::health::HealthResponse;
use crate::handlers::products::{CategoryRef, ProductDetailResponse, ProductResponse};

/// OpenAPI document for the public storefront API. The spec itself is served
/// at `/api/spec`, with Swagger UI mounted at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Boutique API",
        description = "Storefront catalog, session cart and checkout API"
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::featured_products,
        crate::handlers::products::list_categories,
    ),
    components(schemas(
        ErrorResponse,
        HealthResponse,
        ProductResponse,
        ProductDetailResponse,
        CategoryRef,
    )),
    tags(
        (name = "products", description = "Public catalog"),
        (name = "health", description = "Service probes"),
    )
)]
pub struct ApiDoc;

/// Swagger UI plus the raw JSON document route.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api/spec", ApiDoc::openapi())
}
