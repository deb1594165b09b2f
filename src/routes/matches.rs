use actix_web::{http::header, web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{estimate_damage, match_properties, MatchError};
use crate::models::{
    ErrorResponse, HealthResponse, MatchConfig, MatchRequest, MatchResponse, PropertiesQuery,
    PropertiesResponse, SampleSpec, StatsQuery, StatsResponse,
};
use crate::services::{page, project, to_csv_string, CatalogSnapshot, RunCache, ScoredRun};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogSnapshot>,
    pub cache: Arc<RunCache>,
    /// Parameters for runs that do not supply their own
    pub defaults: MatchConfig,
    pub sampling: SampleSpec,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/match", web::post().to(run_match))
        .route("/stats", web::get().to(damage_stats))
        .route("/properties", web::get().to(list_properties))
        .route("/results/{run_id}", web::get().to(download_results));
}

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

fn internal_error(error: &str, message: String) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 500,
    })
}

/// Fetch the run for `config` from the cache, computing it on a miss
///
/// Matching is CPU-bound and runs on the blocking pool.
async fn scored_run(state: &AppState, config: MatchConfig) -> Result<Arc<ScoredRun>, HttpResponse> {
    if let Some(run) = state.cache.get_for(&config).await {
        state.cache.mark_latest(&run.run_id).await;
        return Ok(run);
    }

    let catalog = Arc::clone(&state.catalog);
    let computed = web::block(move || -> Result<ScoredRun, MatchError> {
        let run = match_properties(&catalog.properties, &catalog.events, &config)?;
        let rows = project(&catalog.properties, &run);
        Ok(ScoredRun::new(config, run, rows))
    })
    .await;

    match computed {
        Ok(Ok(run)) => Ok(state.cache.insert(run).await),
        Ok(Err(e)) => {
            tracing::info!("Rejected matching configuration: {}", e);
            Err(bad_request("Invalid configuration", e.to_string()))
        }
        Err(e) => {
            tracing::error!("Matching task failed: {}", e);
            Err(internal_error("Matching failed", e.to_string()))
        }
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        hail_events: state.catalog.events.len(),
        properties: state.catalog.properties.len(),
    })
}

/// Run matching endpoint
///
/// POST /api/v1/match
///
/// Request body (every field optional):
/// ```json
/// {
///   "min_hail_size_in": 1.0,
///   "base_radius_mi": 1.0,
///   "radius_per_inch_mi": 1.0,
///   "max_radius_mi": 5.0
/// }
/// ```
async fn run_match(state: web::Data<AppState>, req: web::Json<MatchRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for match request: {:?}", errors);
        return bad_request("Validation failed", errors.to_string());
    }

    let config = MatchConfig::from(&*req);
    tracing::info!("Running match with {:?}", config);

    let scored = match scored_run(&state, config).await {
        Ok(scored) => scored,
        Err(response) => return response,
    };

    let run = &scored.run;
    HttpResponse::Ok().json(MatchResponse {
        success: true,
        message: format!(
            "Matched {} properties against {} hail events",
            run.results.len(),
            state.catalog.events.len()
        ),
        run_id: scored.run_id.clone(),
        total_properties: run.results.len(),
        damaged_properties: run.damaged_count(),
        hail_events: state.catalog.events.len(),
        candidate_events: run.candidate_events,
        excluded_properties: run.quality.excluded_properties.len(),
        excluded_events: run.quality.excluded_events.len(),
        failed_properties: run.quality.failed_properties.len(),
    })
}

/// Damage statistics endpoint
///
/// GET /api/v1/stats?mode=exact|sampled&sample_size={n}&seed={seed}
async fn damage_stats(state: web::Data<AppState>, query: web::Query<StatsQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let mode = match query.estimate_mode(state.sampling) {
        Ok(mode) => mode,
        Err(message) => return bad_request("Invalid mode", message),
    };

    let catalog = Arc::clone(&state.catalog);
    let config = state.defaults;
    let summary = web::block(move || {
        estimate_damage(&catalog.properties, &catalog.events, &config, mode)
    })
    .await;

    match summary {
        Ok(Ok(summary)) => HttpResponse::Ok().json(StatsResponse::from(summary)),
        Ok(Err(e)) => bad_request("Invalid configuration", e.to_string()),
        Err(e) => {
            tracing::error!("Estimate task failed: {}", e);
            internal_error("Estimate failed", e.to_string())
        }
    }
}

/// Paginated scored properties from the latest run
///
/// GET /api/v1/properties?limit={n}&offset={n}&damaged_only={bool}
///
/// Runs the configured defaults first when no run has been made yet.
async fn list_properties(
    state: web::Data<AppState>,
    query: web::Query<PropertiesQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let scored = match state.cache.latest().await {
        Some(scored) => scored,
        None => match scored_run(&state, state.defaults).await {
            Ok(scored) => scored,
            Err(response) => return response,
        },
    };

    let (properties, total) = page(&scored.rows, query.limit, query.offset, query.damaged_only);

    HttpResponse::Ok().json(PropertiesResponse {
        run_id: scored.run_id.clone(),
        total,
        offset: query.offset,
        limit: query.limit,
        properties,
    })
}

/// CSV download of a cached run
///
/// GET /api/v1/results/{run_id}
async fn download_results(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let run_id = path.into_inner();

    let Some(scored) = state.cache.get(&run_id).await else {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "Run not found".to_string(),
            message: format!("No cached run with id {}", run_id),
            status_code: 404,
        });
    };

    match to_csv_string(&scored.rows) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.csv\"", run_id),
            ))
            .body(body),
        Err(e) => {
            tracing::error!("Failed to write results for {}: {}", run_id, e);
            internal_error("Failed to write results", e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PropertyRecord, StormEvent};
    use actix_web::{test, App};

    fn state() -> AppState {
        let events = vec![
            StormEvent::new("1", 32.78, -96.80, 2.0),
            StormEvent::new("2", 30.00, -95.00, 0.5),
        ];
        let mut unusable = PropertyRecord::new("R3", 32.78, -96.80);
        unusable.latitude = Some(999.0);
        let properties = vec![
            PropertyRecord::new("R1", 32.78, -96.80),
            PropertyRecord::new("R2", 34.00, -96.80),
            unusable,
        ];

        AppState {
            catalog: Arc::new(CatalogSnapshot::new(events, properties)),
            cache: Arc::new(RunCache::new(8, 60)),
            defaults: MatchConfig::default(),
            sampling: SampleSpec { size: 1000, seed: 42 },
        }
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .service(web::scope("/api/v1").configure(configure)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = app!(state());
        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let resp: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.status, "healthy");
        assert_eq!(resp.hail_events, 2);
        assert_eq!(resp.properties, 3);
    }

    #[actix_web::test]
    async fn test_run_match() {
        let app = app!(state());
        let req = test::TestRequest::post()
            .uri("/api/v1/match")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp: MatchResponse = test::call_and_read_body_json(&app, req).await;

        assert!(resp.success);
        assert_eq!(resp.total_properties, 2);
        assert_eq!(resp.damaged_properties, 1);
        assert_eq!(resp.hail_events, 2);
        assert_eq!(resp.candidate_events, 1);
        assert_eq!(resp.excluded_properties, 1);
        assert_eq!(resp.run_id, crate::services::CacheKey::run(&MatchConfig::default()));
    }

    #[actix_web::test]
    async fn test_run_match_rejects_bad_radius() {
        let app = app!(state());
        let req = test::TestRequest::post()
            .uri("/api/v1/match")
            .set_json(serde_json::json!({ "base_radius_mi": 6.0, "max_radius_mi": 5.0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_stats_modes() {
        let app = app!(state());

        let req = test::TestRequest::get().uri("/api/v1/stats").to_request();
        let exact: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(exact["mode"], "exact");
        assert_eq!(exact["damaged"], 1);

        let req = test::TestRequest::get()
            .uri("/api/v1/stats?mode=sampled&sample_size=1&seed=3")
            .to_request();
        let sampled: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(sampled["mode"], "sampled");
        assert_eq!(sampled["sampled_properties"], 1);

        let req = test::TestRequest::get().uri("/api/v1/stats?mode=fast").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_properties_page() {
        let app = app!(state());
        let req = test::TestRequest::get()
            .uri("/api/v1/properties?limit=1&damaged_only=true")
            .to_request();
        let resp: PropertiesResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.total, 1);
        assert_eq!(resp.properties.len(), 1);
        assert_eq!(resp.properties[0].account_number, "R1");
        assert!(resp.properties[0].hail_damage_likely);
    }

    #[actix_web::test]
    async fn test_results_download() {
        let app = app!(state());

        let req = test::TestRequest::post()
            .uri("/api/v1/match")
            .set_json(serde_json::json!({}))
            .to_request();
        let matched: MatchResponse = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/results/{}", matched.run_id))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let csv = String::from_utf8(body.to_vec()).unwrap();

        assert!(csv.starts_with("property_address,"));
        assert_eq!(csv.lines().count(), 3);

        let req = test::TestRequest::get().uri("/api/v1/results/run-missing").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}
