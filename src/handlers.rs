use actix_multipart::Multipart;
use actix_web::http::header::ContentType;
use actix_web::{get, post, web, HttpResponse};
use chrono::NaiveDate;
use futures_util::StreamExt as _;
use log::info;
use serde::Deserialize;
use crate::archive;
use crate::errors::ApiError;
use crate::file_loader;
use crate::initialization::Config;
use crate::manager_forecast::{self, DEFAULT_MODEL};
use crate::manager_meteo::Meteo;
use crate::manager_pse::Pse;
use crate::models::{
    DateCount, GenerationRecord, MeteoRecord, TablePreview, GENERATION_COLUMNS,
    METEO_HOURLY_COLUMNS,
};
use crate::render;
use crate::store::Store;
use crate::AppState;

#[derive(Deserialize)]
struct MeteoHistoryParams {
    start_date: NaiveDate,
    end_date: NaiveDate,
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct MeteoForecastParams {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct GenerationParams {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Deserialize)]
struct CreateForecastParams {
    #[serde(default = "default_model_name")]
    model_name: String,
    #[serde(default = "default_steps")]
    steps: usize,
    #[serde(default = "default_n_lags")]
    n_lags: usize,
}

fn default_model_name() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_steps() -> usize {
    24
}
fn default_n_lags() -> usize {
    24
}

#[derive(Deserialize)]
struct AggDataParams {
    table: String,
}

#[get("/fetch_meteo")]
pub async fn fetch_meteo(
    data: web::Data<AppState>,
    params: web::Query<MeteoHistoryParams>,
) -> Result<HttpResponse, ApiError> {
    validate_range(params.start_date, params.end_date)?;

    let rows = Meteo::new(&data.config.apis)?
        .fetch_history(params.start_date, params.end_date, params.latitude, params.longitude)
        .await?;

    import_meteo(&data.config, rows).await
}

#[get("/fetch_meteo_forecast")]
pub async fn fetch_meteo_forecast(
    data: web::Data<AppState>,
    params: web::Query<MeteoForecastParams>,
) -> Result<HttpResponse, ApiError> {
    let rows = Meteo::new(&data.config.apis)?
        .fetch_forecast(params.latitude, params.longitude)
        .await?;

    import_meteo(&data.config, rows).await
}

#[get("/fetch_generation")]
pub async fn fetch_generation(
    data: web::Data<AppState>,
    params: web::Query<GenerationParams>,
) -> Result<HttpResponse, ApiError> {
    validate_range(params.start_date, params.end_date)?;

    let rows = Pse::new(&data.config.apis)?
        .fetch_generation(params.start_date, params.end_date)
        .await?;

    import_generation(&data.config, rows).await
}

#[post("/upload")]
pub async fn upload(
    data: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut filename = String::new();
    let mut content: Vec<u8> = Vec::new();

    while let Some(field) = payload.next().await {
        let mut field = field
            .map_err(|e| ApiError::BadRequest(format!("invalid multipart payload: {}", e)))?;
        if field.name() != "file" {
            continue;
        }

        filename = field
            .content_disposition()
            .get_filename()
            .unwrap_or_default()
            .to_string();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| ApiError::BadRequest(format!("broken upload stream: {}", e)))?;
            content.extend_from_slice(&chunk);
        }
    }

    if filename.is_empty() {
        return Err(ApiError::BadRequest(
            "multipart field 'file' with a filename is required".to_string(),
        ));
    }

    let rows = file_loader::load_generation_file(&filename, &content)?;
    import_generation(&data.config, rows).await
}

#[get("/create_forecast")]
pub async fn create_forecast(
    data: web::Data<AppState>,
    params: web::Query<CreateForecastParams>,
) -> Result<HttpResponse, ApiError> {
    manager_forecast::ensure_supported(&params.model_name)?;

    let db_path = data.config.files.db_path.clone();
    let model_path = data.config.files.model_path.clone();
    let params = params.into_inner();

    let html = web::block(move || -> Result<String, ApiError> {
        let store = Store::open(&db_path)?;
        let generation = store.load_generation()?;
        let meteo = store.load_meteo()?;

        let (joined, future) = manager_forecast::join_series(&generation, &meteo);
        let summary =
            manager_forecast::train_and_save(&joined, &params.model_name, params.n_lags, &model_path)?;
        info!(
            "trained {} on {} rows (mae {:.3}, rmse {:.3})",
            params.model_name, summary.training_rows, summary.mae, summary.rmse
        );

        let points =
            manager_forecast::predict_future(&joined, &future, params.steps, &model_path)?;
        Ok(render::forecast_table(&points))
    })
    .await??;

    Ok(HttpResponse::Ok().content_type(ContentType::html()).body(html))
}

#[get("/get_agg_data")]
pub async fn get_agg_data(
    data: web::Data<AppState>,
    params: web::Query<AggDataParams>,
) -> Result<HttpResponse, ApiError> {
    let table = params.table.clone();
    let db_path = data.config.files.db_path.clone();

    let rows = web::block(move || -> Result<Vec<DateCount>, ApiError> {
        match table.as_str() {
            "generation" => Ok(Store::open(&db_path)?.generation_dates()?),
            "meteo" => Ok(Store::open(&db_path)?.meteo_dates()?),
            other => Err(ApiError::BadRequest(format!(
                "unknown table '{}', expected 'generation' or 'meteo'",
                other
            ))),
        }
    })
    .await??;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(render::dates_table(&rows)))
}

fn validate_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), ApiError> {
    if start_date > end_date {
        return Err(ApiError::BadRequest(
            "start_date must not be later than end_date".to_string(),
        ));
    }
    Ok(())
}

/// Archives a fetched weather batch, upserts it and returns the preview.
async fn import_meteo(config: &Config, rows: Vec<MeteoRecord>) -> Result<HttpResponse, ApiError> {
    archive::store_batches(&config.files.data_dir, "meteo", &rows, |r| r.business_date()).await?;

    let db_path = config.files.db_path.clone();
    let db_rows = rows.clone();
    let written = web::block(move || Store::open(&db_path)?.upsert_meteo(&db_rows)).await??;
    info!("imported {} meteo rows", written);

    Ok(HttpResponse::Ok().json(TablePreview::from_records(&meteo_columns(), &rows)))
}

/// Archives an imported generation batch, upserts it and returns the preview.
async fn import_generation(
    config: &Config,
    rows: Vec<GenerationRecord>,
) -> Result<HttpResponse, ApiError> {
    archive::store_batches(&config.files.data_dir, "pse", &rows, |r| r.business_date()).await?;

    let db_path = config.files.db_path.clone();
    let db_rows = rows.clone();
    let written = web::block(move || Store::open(&db_path)?.upsert_generation(&db_rows)).await??;
    info!("imported {} generation rows", written);

    Ok(HttpResponse::Ok().json(TablePreview::from_records(&GENERATION_COLUMNS, &rows)))
}

fn meteo_columns() -> Vec<&'static str> {
    let mut columns = vec!["time"];
    columns.extend(METEO_HOURLY_COLUMNS);
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use chrono::{Duration, NaiveDateTime};
    use crate::initialization::{Apis, Files, WebServer};

    fn test_state(tag: &str) -> (web::Data<AppState>, String) {
        let dir = std::env::temp_dir().join(format!("pv-handlers-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let dir = dir.to_str().unwrap().to_string();

        let config = Config {
            web_server: WebServer { bind_address: "127.0.0.1".to_string(), bind_port: 0 },
            apis: Apis {
                pse_url: "http://127.0.0.1:9/pse".to_string(),
                meteo_hist_url: "http://127.0.0.1:9/archive".to_string(),
                meteo_frcst_url: "http://127.0.0.1:9/forecast".to_string(),
            },
            files: Files {
                data_dir: dir.clone(),
                db_path: format!("{}/app.db", dir),
                model_path: format!("{}/model.bin", dir),
            },
        };

        (web::Data::new(AppState { config }), dir)
    }

    fn hour(offset: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::hours(offset)
    }

    fn meteo_at(offset: i64) -> MeteoRecord {
        MeteoRecord {
            time: hour(offset),
            temperature_2m: Some(20.0),
            cloud_cover: Some(30.0),
            wind_speed_10m: Some(4.0),
            wind_gusts_10m: Some(8.0),
            relative_humidity_2m: Some(60.0),
            shortwave_radiation: Some(500.0),
            direct_radiation: Some(350.0),
            diffuse_radiation: Some(150.0),
            global_tilted_irradiance: Some(450.0),
            direct_normal_irradiance: Some(600.0),
            terrestrial_radiation: Some(1100.0),
        }
    }

    #[actix_web::test]
    async fn fetch_meteo_rejects_inverted_date_range() {
        let (state, _) = test_state("meteo-range");
        let app = test::init_service(App::new().app_data(state).service(fetch_meteo)).await;

        let req = test::TestRequest::get()
            .uri("/fetch_meteo?start_date=2024-06-02&end_date=2024-06-01&latitude=52.2&longitude=21.0")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status().as_u16(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().contains("start_date"));
    }

    #[actix_web::test]
    async fn fetch_generation_rejects_inverted_date_range() {
        let (state, _) = test_state("gen-range");
        let app = test::init_service(App::new().app_data(state).service(fetch_generation)).await;

        let req = test::TestRequest::get()
            .uri("/fetch_generation?start_date=2024-06-02&end_date=2024-06-01")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status().as_u16(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().is_some());
    }

    #[actix_web::test]
    async fn create_forecast_rejects_unknown_model() {
        let (state, _) = test_state("bad-model");
        let app = test::init_service(App::new().app_data(state).service(create_forecast)).await;

        let req = test::TestRequest::get()
            .uri("/create_forecast?model_name=MLPRegressor")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status().as_u16(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().contains("unknown model name"));
    }

    #[actix_web::test]
    async fn get_agg_data_rejects_unknown_table() {
        let (state, _) = test_state("bad-table");
        let app = test::init_service(App::new().app_data(state).service(get_agg_data)).await;

        let req = test::TestRequest::get().uri("/get_agg_data?table=prices").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status().as_u16(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().contains("unknown table"));
    }

    #[actix_web::test]
    async fn get_agg_data_renders_counts_per_date() {
        let (state, dir) = test_state("agg-ok");

        let rows: Vec<GenerationRecord> = (0..30)
            .map(|i| GenerationRecord { plan_dtime: hour(i), fcst_pv_tot_gen: i as f64 })
            .collect();
        Store::open(&format!("{}/app.db", dir))
            .unwrap()
            .upsert_generation(&rows)
            .unwrap();

        let app = test::init_service(App::new().app_data(state).service(get_agg_data)).await;
        let req = test::TestRequest::get().uri("/get_agg_data?table=generation").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<td>2024-06-01</td>"));
        assert!(body.contains("<td>24</td>"));
        assert!(body.contains("<td>2024-06-02</td>"));
        assert!(body.contains("<td>6</td>"));
    }

    #[actix_web::test]
    async fn create_forecast_returns_a_table_for_a_populated_store() {
        let (state, dir) = test_state("forecast-ok");

        let generation: Vec<GenerationRecord> = (0..48)
            .map(|i| GenerationRecord {
                plan_dtime: hour(i),
                fcst_pv_tot_gen: (i % 24) as f64,
            })
            .collect();
        let meteo: Vec<MeteoRecord> = (0..54).map(meteo_at).collect();

        let mut store = Store::open(&format!("{}/app.db", dir)).unwrap();
        store.upsert_generation(&generation).unwrap();
        store.upsert_meteo(&meteo).unwrap();

        let app = test::init_service(App::new().app_data(state).service(create_forecast)).await;
        let req = test::TestRequest::get()
            .uri("/create_forecast?model_name=Ridge&steps=6&n_lags=4")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("<table"));
        assert!(body.contains("2024-06-03 00:00:00"));
        assert!(std::path::Path::new(&format!("{}/model.bin", dir)).exists());
    }

    #[actix_web::test]
    async fn upload_imports_a_csv_file() {
        let (state, _) = test_state("upload-ok");
        let app = test::init_service(App::new().app_data(state).service(upload)).await;

        let boundary = "----pv-test-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"gen.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             2024-06-01 10:00:00,12.5\r\n2024-06-01 11:00:00,14.0\r\n--{b}--\r\n",
            b = boundary
        );
        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            ))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["columns"][0], "plan_dtime");
        assert_eq!(body["preview"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn upload_rejects_unsupported_extension() {
        let (state, _) = test_state("upload-bad");
        let app = test::init_service(App::new().app_data(state).service(upload)).await;

        let boundary = "----pv-test-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"gen.xlsx\"\r\n\r\n\
             data\r\n--{b}--\r\n",
            b = boundary
        );
        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            ))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status().as_u16(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().contains("unsupported file format"));
    }
}
