//! Read-only catalog endpoints backing the static site sections.
use actix_web::{HttpResponse, Responder, get};

use crate::catalog;

#[get("/api/catalog/teams")]
pub async fn teams() -> impl Responder {
    HttpResponse::Ok().json(catalog::teams())
}

#[get("/api/catalog/sponsor-packages")]
pub async fn sponsor_packages() -> impl Responder {
    HttpResponse::Ok().json(catalog::sponsor_packages())
}

#[get("/api/catalog/contact")]
pub async fn contact() -> impl Responder {
    HttpResponse::Ok().json(catalog::contact_points())
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};

    use super::*;

    #[actix_web::test]
    async fn catalog_endpoints_serve_json() {
        let app = test::init_service(
            App::new()
                .service(teams)
                .service(sponsor_packages)
                .service(contact),
        )
        .await;

        for uri in [
            "/api/catalog/teams",
            "/api/catalog/sponsor-packages",
            "/api/catalog/contact",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert!(body.as_array().is_some_and(|items| !items.is_empty()), "{uri}");
        }
    }
}
