use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use super::Metrics;
use crate::health::HealthRegistry;

/// Serve `/metrics` and `/health` on their own port, apart from the API.
pub async fn start_metrics_server(
    metrics: Arc<Metrics>,
    health: HealthRegistry,
    host: &str,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!("📊 Starting metrics server on http://{}:{}/metrics", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(metrics.clone()))
            .app_data(web::Data::new(health.clone()))
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_handler))
        .route("/health", web::get().to(health_handler));
}

async fn metrics_handler(metrics: web::Data<Arc<Metrics>>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(health: web::Data<HealthRegistry>) -> impl Responder {
    let report = health.check().await;

    if report.overall_status.is_unhealthy() {
        HttpResponse::ServiceUnavailable().json(report.to_json())
    } else {
        HttpResponse::Ok().json(report.to_json())
    }
}
