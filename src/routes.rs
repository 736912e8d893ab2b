use crate::{
    api::{account, department, employee, request, workflow},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter. Config guarantees a non-zero rate.
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = 60_000 / u64::from(requests_per_min.max(1));
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms.max(1))
            .burst_size(requests_per_min.max(1))
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Malformed bodies and query strings are validation errors
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::validation(None, err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::validation(None, err.to_string()).into()
    }));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/authenticate")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::authenticate)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/verify-email")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::verify_email)),
            )
            .service(
                web::resource("/email-exists")
                    .wrap(register_limiter.clone())
                    .route(web::get().to(handlers::email_exists)),
            )
            .service(
                web::resource("/forgot-password")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::forgot_password)),
            )
            .service(
                web::resource("/validate-reset-token")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::validate_reset_token)),
            )
            .service(
                web::resource("/reset-password")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::reset_password)),
            )
            .service(
                web::resource("/refresh-token")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/revoke-token")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::revoke_token)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/accounts")
                    .service(
                        web::resource("")
                            .route(web::get().to(account::list_accounts))
                            .route(web::post().to(account::create_account)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(account::get_account))
                            .route(web::put().to(account::update_account))
                            .route(web::delete().to(account::delete_account)),
                    ),
            )
            .service(
                web::scope("/departments")
                    .service(
                        web::resource("")
                            .route(web::get().to(department::list_departments))
                            .route(web::post().to(department::create_department)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(department::get_department))
                            .route(web::put().to(department::update_department))
                            .route(web::delete().to(department::delete_department)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    // /employees/{id}/transfer
                    .service(
                        web::resource("/{id}/transfer")
                            .route(web::put().to(employee::transfer_employee)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/requests")
                    .service(
                        web::resource("")
                            .route(web::get().to(request::list_requests))
                            .route(web::post().to(request::create_request)),
                    )
                    // /requests/employee/{employee_id}
                    .service(
                        web::resource("/employee/{employee_id}")
                            .route(web::get().to(request::list_employee_requests)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(request::get_request))
                            .route(web::put().to(request::update_request))
                            .route(web::delete().to(request::delete_request)),
                    ),
            )
            .service(
                web::scope("/workflows")
                    .service(
                        web::resource("")
                            .route(web::get().to(workflow::list_workflows))
                            .route(web::post().to(workflow::create_workflow)),
                    )
                    .service(
                        web::resource("/employee/{employee_id}")
                            .route(web::get().to(workflow::list_employee_workflows)),
                    )
                    .service(
                        web::resource("/onboarding")
                            .route(web::post().to(workflow::create_onboarding)),
                    )
                    .service(
                        web::resource("/transfer").route(web::post().to(workflow::create_transfer)),
                    )
                    .service(web::resource("/leave").route(web::post().to(workflow::create_leave)))
                    .service(
                        web::resource("/resources")
                            .route(web::post().to(workflow::create_resources)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(workflow::get_workflow))
                            .route(web::put().to(workflow::update_workflow))
                            .route(web::delete().to(workflow::delete_workflow)),
                    ),
            ),
    );
}

// AUTHENTICATE
//  ├─ access_token (ACCESS_TOKEN_TTL)
//  └─ refresh_token (REFRESH_TOKEN_TTL, jti stored)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh-token with Bearer refresh_token
//       └─ revokes the old jti, returns a new pair

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::jwt::generate_access_token,
        config::SeedAdmin,
        model::role::Role,
        service::{account::ensure_seed_admin, testing},
        store::Repositories,
        utils::email_index::EmailIndex,
    };
    use actix_web::{
        App,
        http::{StatusCode, header},
        test::{self, TestRequest},
    };
    use serde_json::{Value, json};
    use std::net::SocketAddr;

    const ADMIN_EMAIL: &str = "admin@example.com";
    const ADMIN_PASSWORD: &str = "admin-password";

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn seeded_index(repos: &Repositories) -> EmailIndex {
        let index = EmailIndex::new();
        ensure_seed_admin(
            repos,
            &index,
            &SeedAdmin {
                email: ADMIN_EMAIL.into(),
                password: ADMIN_PASSWORD.into(),
            },
        )
        .await
        .unwrap();
        index
    }

    macro_rules! app {
        ($config:expr, $repos:expr) => {{
            let config: Config = $config;
            let repos: Repositories = $repos;
            let index = seeded_index(&repos).await;
            let routes_config = config.clone();
            test::init_service(
                App::new()
                    .app_data(web::Data::new(repos))
                    .app_data(web::Data::new(index))
                    .app_data(web::Data::new(config))
                    .configure(move |cfg| configure(cfg, routes_config.clone())),
            )
            .await
        }};
    }

    fn authenticate_request(password: &str) -> TestRequest {
        TestRequest::post()
            .uri("/auth/authenticate")
            .peer_addr(peer())
            .set_json(json!({"email": ADMIN_EMAIL, "password": password}))
    }

    fn bearer(token: &str) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    fn user_token(config: &Config, account_id: u64, email: &str) -> String {
        generate_access_token(
            account_id,
            email.to_string(),
            Role::User.id(),
            &config.jwt_secret,
            config.access_token_ttl,
        )
        .unwrap()
    }

    #[actix_web::test]
    async fn admin_authenticates_and_manages_departments() {
        let app = app!(Config::test(), Repositories::in_memory());

        let req = authenticate_request(ADMIN_PASSWORD).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["email"], ADMIN_EMAIL);
        let token = body["access_token"].as_str().unwrap().to_string();

        let req = TestRequest::post()
            .uri("/api/departments")
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .set_json(json!({"name": "Engineering"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = TestRequest::get()
            .uri("/api/departments")
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Engineering");
    }

    #[actix_web::test]
    async fn wrong_password_is_unauthenticated() {
        let app = app!(Config::test(), Repositories::in_memory());
        let resp = test::call_service(&app, authenticate_request("nope").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Email or password is incorrect");
    }

    #[actix_web::test]
    async fn protected_routes_need_a_token() {
        let app = app!(Config::test(), Repositories::in_memory());
        let req = TestRequest::get()
            .uri("/api/employees")
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn non_admin_cannot_mutate_departments() {
        let config = Config::test();
        let repos = Repositories::in_memory();
        let user_id = testing::account(&repos, "user@example.com", Role::User).await;
        let token = user_token(&config, user_id, "user@example.com");
        let app = app!(config, repos);

        let req = TestRequest::post()
            .uri("/api/departments")
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .set_json(json!({"name": "Sales"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn owner_files_leave_and_it_is_recorded() {
        let config = Config::test();
        let repos = Repositories::in_memory();
        let employee_id = testing::employee(&repos, "owner@example.com").await;
        let account_id = repos.employees.find(employee_id).await.unwrap().unwrap().account_id;
        let token = user_token(&config, account_id, "owner@example.com");
        let app = app!(config, repos.clone());

        let req = TestRequest::post()
            .uri("/api/requests")
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .set_json(json!({
                "type": "Leave",
                "start_date": "2026-03-02",
                "end_date": "2026-03-04"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["request"]["employee_id"], employee_id);
        assert_eq!(body["request"]["status"], "Pending");
        assert_eq!(body["request"]["request_leave"]["start_date"], "2026-03-02");

        let workflows = repos.workflows.list_by_employee(employee_id).await.unwrap();
        assert_eq!(workflows.len(), 1);
        assert_eq!(
            workflows[0].details,
            "Test User requested leave from 2026-03-02 to 2026-03-04"
        );

        let req = TestRequest::get()
            .uri(&format!("/api/requests/employee/{employee_id}"))
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn owner_cannot_approve_own_request() {
        let config = Config::test();
        let repos = Repositories::in_memory();
        let employee_id = testing::employee(&repos, "owner@example.com").await;
        let account_id = repos.employees.find(employee_id).await.unwrap().unwrap().account_id;
        let token = user_token(&config, account_id, "owner@example.com");
        let app = app!(config, repos);

        let req = TestRequest::post()
            .uri("/api/requests")
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .set_json(json!({"type": "Equipment", "items": [{"name": "Laptop", "quantity": 1}]}))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let request_id = body["request"]["id"].as_u64().unwrap();

        let req = TestRequest::put()
            .uri(&format!("/api/requests/{request_id}"))
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .set_json(json!({"status": "Approved"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn malformed_items_are_a_validation_error() {
        let app = app!(Config::test(), Repositories::in_memory());
        let req = authenticate_request(ADMIN_PASSWORD).to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let token = body["access_token"].as_str().unwrap().to_string();

        let req = TestRequest::post()
            .uri("/api/requests")
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .set_json(json!({"employee_id": 1, "type": "Equipment", "items": "Laptop"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn refresh_token_rotates_once() {
        let app = app!(Config::test(), Repositories::in_memory());
        let req = authenticate_request(ADMIN_PASSWORD).to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let refresh = body["refresh_token"].as_str().unwrap().to_string();

        let rotate = || {
            TestRequest::post()
                .uri("/auth/refresh-token")
                .peer_addr(peer())
                .insert_header(bearer(&refresh))
                .to_request()
        };
        let resp = test::call_service(&app, rotate()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = test::call_service(&app, rotate()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn authenticate_is_rate_limited_per_ip() {
        let mut config = Config::test();
        config.rate_login_per_min = 2;
        let app = app!(config, Repositories::in_memory());

        for _ in 0..2 {
            let resp = test::call_service(&app, authenticate_request("nope").to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
        let req = authenticate_request(ADMIN_PASSWORD).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
