use actix_web::{get, HttpResponse};

use crate::types::HealthResponse;

/// Liveness probe
#[get("/")]
pub async fn index() -> actix_web::Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        message: "Backend Lojavoz funcionando!".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_index_reports_liveness() {
        let app = test::init_service(App::new().service(index)).await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: HealthResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "Backend Lojavoz funcionando!");
    }
}
