use actix_web::{HttpResponse, http::header, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::timesheet::{TimesheetEntry, TimesheetInput};
use crate::service::timesheet as timesheets;
use crate::store::Store;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TimesheetQuery {
    /// Only return rows owned by this employee
    #[param(example = 1)]
    pub employee_id: Option<u64>,
}

/// List Timesheets
#[utoipa::path(
    get,
    path = "/api/timesheets",
    params(TimesheetQuery),
    responses(
        (status = 200, description = "Timesheets, newest first, with their employee", body = [TimesheetEntry])
    ),
    tag = "Timesheet"
)]
pub async fn list_timesheets(
    store: web::Data<dyn Store>,
    query: web::Query<TimesheetQuery>,
) -> AppResult<HttpResponse> {
    let entries = timesheets::list(store.get_ref(), query.employee_id).await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Get Timesheet by ID
#[utoipa::path(
    get,
    path = "/api/timesheets/{timesheet_id}",
    params(
        ("timesheet_id" = u64, Path, description = "Timesheet ID")
    ),
    responses(
        (status = 200, description = "Timesheet found", body = TimesheetEntry),
        (status = 404, description = "Timesheet not found.")
    ),
    tag = "Timesheet"
)]
pub async fn get_timesheet(
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let entry = timesheets::get(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(entry))
}

/// Create Timesheet
#[utoipa::path(
    post,
    path = "/api/timesheets",
    request_body = TimesheetInput,
    responses(
        (status = 201, description = "Timesheet created", body = TimesheetEntry),
        (status = 400, description = "Missing field, bad time range or unknown employee", body = Object, example = json!({
            "message": "endTime cannot be before startTime"
        }))
    ),
    tag = "Timesheet"
)]
pub async fn create_timesheet(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<TimesheetInput>,
) -> AppResult<HttpResponse> {
    let timesheet = payload.into_inner().validate()?;
    let entry = timesheets::create(store.get_ref(), timesheet).await?;

    Ok(HttpResponse::Created()
        .insert_header((
            header::LOCATION,
            format!("{}/timesheets/{}", config.api_prefix, entry.timesheet.id),
        ))
        .json(entry))
}

/// Replace Timesheet
#[utoipa::path(
    put,
    path = "/api/timesheets/{timesheet_id}",
    params(
        ("timesheet_id" = u64, Path, description = "Timesheet ID")
    ),
    request_body = TimesheetInput,
    responses(
        (status = 204, description = "Timesheet updated"),
        (status = 400, description = "Timesheet ID mismatch or invalid body"),
        (status = 404, description = "Timesheet not found.")
    ),
    tag = "Timesheet"
)]
pub async fn replace_timesheet(
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
    payload: web::Json<TimesheetInput>,
) -> AppResult<HttpResponse> {
    let timesheet_id = path.into_inner();
    let input = payload.into_inner();
    if input.id.is_some_and(|id| id != timesheet_id) {
        return Err(AppError::validation("Timesheet ID mismatch."));
    }

    timesheets::replace(store.get_ref(), timesheet_id, input.validate()?).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete Timesheet
#[utoipa::path(
    delete,
    path = "/api/timesheets/{timesheet_id}",
    params(
        ("timesheet_id" = u64, Path, description = "Timesheet ID")
    ),
    responses(
        (status = 204, description = "Timesheet deleted"),
        (status = 404, description = "Timesheet not found.")
    ),
    tag = "Timesheet"
)]
pub async fn delete_timesheet(
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    timesheets::delete(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
