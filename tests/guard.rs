use std::sync::atomic::{AtomicUsize, Ordering};

use actix_accepts::{Acceptable, AcceptableTypes};
use actix_web::{
    http::{header, StatusCode},
    test::{self, TestRequest},
    web, App, HttpResponse,
};

async fn handled(hits: web::Data<AtomicUsize>) -> HttpResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    HttpResponse::Ok().body("OK")
}

fn get(uri: &str, accept: &'static str) -> TestRequest {
    TestRequest::get()
        .uri(uri)
        .insert_header((header::ACCEPT, accept))
}

#[actix_web::test]
async fn per_resource() {
    let _ = env_logger::builder().is_test(true).try_init();

    let hits = web::Data::new(AtomicUsize::new(0));
    let srv = test::init_service(
        App::new().app_data(hits.clone()).service(
            web::resource("/")
                .wrap(Acceptable::types(["text/plain"]))
                .to(handled),
        ),
    )
    .await;

    let req = get("/", "text/plain, application/json").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(test::read_body(res).await, "OK");

    let req = get("/", "*/*").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    let req = get("/", "application/json").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(test::read_body(res).await, "Not Acceptable");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[actix_web::test]
async fn per_route() {
    let srv = test::init_service(App::new().service(
        web::resource("/").route(
            web::get()
                .to(|| async { "OK" })
                .wrap(Acceptable::types(["text/plain"])),
        ),
    ))
    .await;

    let req = get("/", "text/plain, application/json").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = get("/", "application/json").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);

    let req = get("/", "*/*").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn per_group() {
    let hits = web::Data::new(AtomicUsize::new(0));
    let srv = test::init_service(
        App::new().app_data(hits.clone()).service(
            web::scope("/group")
                .wrap(Acceptable::types(["text/plain"]))
                .route("/one", web::get().to(handled))
                .route("/two", web::get().to(handled)),
        ),
    )
    .await;

    let req = get("/group/one", "text/plain, application/json").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = get("/group/two", "*/*").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = get("/group/two", "application/json").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(test::read_body(res).await, "Not Acceptable");

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[actix_web::test]
async fn group_declaration_in_app_data() {
    let srv = test::init_service(
        App::new().service(
            web::scope("/api")
                .app_data(AcceptableTypes::new(["json"]))
                .wrap(Acceptable::new())
                .route("/items", web::get().to(|| async { "[]" })),
        ),
    )
    .await;

    let req = get("/api/items", "application/json").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = get("/api/items", "text/html").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);
}

#[actix_web::test]
async fn resource_declaration_overrides_group() {
    let srv = test::init_service(
        App::new().service(
            web::scope("/api")
                .app_data(AcceptableTypes::new(["json"]))
                .service(
                    web::resource("/report")
                        .app_data(AcceptableTypes::new(["text/csv"]))
                        .wrap(Acceptable::new())
                        .to(|| async { "a,b" }),
                )
                .service(
                    web::resource("/items")
                        .wrap(Acceptable::new())
                        .to(|| async { "[]" }),
                ),
        ),
    )
    .await;

    let req = get("/api/report", "text/csv").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = get("/api/report", "application/json").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);

    let req = get("/api/items", "application/json").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = get("/api/items", "text/csv").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);
}

#[actix_web::test]
async fn missing_accept_header_passes() {
    let srv = test::init_service(
        App::new().service(
            web::resource("/")
                .wrap(Acceptable::types(["text/plain"]))
                .to(|| async { "OK" }),
        ),
    )
    .await;

    let req = TestRequest::get().uri("/").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn nested_inline_guards_all_apply() {
    let srv = test::init_service(
        App::new().service(
            web::scope("/api")
                .wrap(Acceptable::types(["json"]))
                .service(
                    web::resource("/report")
                        .wrap(Acceptable::types(["text/plain"]))
                        .to(|| async { "OK" }),
                ),
        ),
    )
    .await;

    // satisfies the resource guard only
    let req = get("/api/report", "text/plain").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);

    // satisfies the scope guard only
    let req = get("/api/report", "application/json").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);

    let req = get("/api/report", "application/json, text/plain").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}
