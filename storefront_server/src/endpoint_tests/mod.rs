mod checkout;
mod helpers;
mod mocks;
mod webhook;

mod misc {
    use actix_web::{http::StatusCode, test::TestRequest};

    use super::{
        helpers::{new_test_db, send_request},
        mocks::MockProvider,
    };
    use crate::config::ServerConfig;

    #[actix_web::test]
    async fn health_endpoint() {
        let db = new_test_db().await;
        let config = ServerConfig::default();
        let res = send_request(TestRequest::get().uri("/health"), &config, db, MockProvider::new()).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body, "👍️\n");
    }

    #[actix_web::test]
    async fn cors_headers_on_every_response() {
        let db = new_test_db().await;
        let config = ServerConfig { cors_allowed_origin: "https://shop.example".into(), ..Default::default() };
        let res = send_request(TestRequest::get().uri("/health"), &config, db, MockProvider::new()).await;
        assert_eq!(res.header("Access-Control-Allow-Origin"), Some("https://shop.example"));
        let allowed_headers = "authorization, x-client-info, apikey, content-type";
        assert_eq!(res.header("Access-Control-Allow-Headers"), Some(allowed_headers));
        assert_eq!(res.header("Access-Control-Allow-Methods"), Some("GET, POST, OPTIONS"));
    }

    #[actix_web::test]
    async fn unknown_routes_still_get_cors_headers() {
        let db = new_test_db().await;
        let config = ServerConfig::default();
        let res = send_request(TestRequest::get().uri("/nope"), &config, db, MockProvider::new()).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.header("Access-Control-Allow-Origin"), Some("*"));
    }
}
