use actix_accepts::{Acceptable, AcceptableTypes, Accepts};
use actix_web::{get, middleware, web, App, HttpResponse, HttpServer, Responder};

#[get("/")]
async fn index(accepts: Accepts) -> impl Responder {
    HttpResponse::Ok().json((
        ("types", accepts.types()),
        ("charsets", accepts.charsets()),
        ("encodings", accepts.encodings()),
        ("languages", accepts.languages()),
    ))
}

async fn greeting(accepts: Accepts) -> HttpResponse {
    let greeting = match accepts.language(&["en", "de", "fr"]) {
        Some("de") => "Hallo",
        Some("fr") => "Bonjour",
        _ => "Hello",
    };

    match accepts.type_(&["json", "text/plain"]) {
        Some("json") => HttpResponse::Ok().json([greeting]),
        _ => HttpResponse::Ok().body(greeting),
    }
}

async fn report() -> HttpResponse {
    HttpResponse::Ok().content_type("text/csv").body("name,count\nwidgets,3\n")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("starting HTTP server at http://localhost:8080");

    HttpServer::new(|| {
        App::new()
            .service(index)
            .service(
                web::resource("/greeting")
                    .wrap(Acceptable::types(["json", "text/plain"]))
                    .to(greeting),
            )
            .service(
                web::scope("/reports")
                    .app_data(AcceptableTypes::new(["csv"]))
                    .wrap(Acceptable::new())
                    .route("/daily", web::get().to(report)),
            )
            .wrap(middleware::Logger::default())
    })
    .bind(("127.0.0.1", 8080))?
    .workers(2)
    .run()
    .await
}
