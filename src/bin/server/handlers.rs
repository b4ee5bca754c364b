use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{Html, IntoResponse, Response},
};
use log::{debug, error, info, warn};
use retpredict::{export, input, Error, Model};

use crate::{templates::Index, AppState};

const SKIPPED_HEADER: HeaderName = HeaderName::from_static("x-skipped-rows");

fn page(state: &AppState, status: StatusCode, warning: Option<String>) -> Response {
    let index = Index {
        title: state.config.title.clone(),
        model_name: state.model.name().to_owned(),
        column: state.config.smiles_column.clone(),
        warning,
    };
    match index.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("failed to render index: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(crate) async fn index(State(state): State<Arc<AppState>>) -> Response {
    page(&state, StatusCode::OK, None)
}

/// The fields of a submitted form.
#[derive(Debug, Default)]
pub(crate) struct Form {
    pub(crate) smiles: Option<String>,
    pub(crate) file: Option<Vec<u8>>,
}

async fn read_form(mut multipart: Multipart) -> Result<Form, Response> {
    let mut form = Form::default();
    let bad = |e: axum::extract::multipart::MultipartError| {
        warn!("rejected form: {e}");
        (e.status(), e.body_text()).into_response()
    };
    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("smiles") => form.smiles = Some(field.text().await.map_err(bad)?),
            Some("file") => {
                debug!("receiving upload {:?}", field.file_name());
                form.file = Some(field.bytes().await.map_err(bad)?.to_vec());
            }
            other => debug!("ignoring form field {other:?}"),
        }
    }
    Ok(form)
}

pub(crate) async fn predict(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Response {
    match read_form(multipart).await {
        Ok(form) => respond(state, form).await,
        Err(resp) => resp,
    }
}

/// run the pipeline for `form` off the async runtime and turn the outcome
/// into either a CSV download or the form page with a warning
pub(crate) async fn respond(state: Arc<AppState>, form: Form) -> Response {
    let worker = state.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<_, Error> {
        let column = &worker.config.smiles_column;
        let smiles =
            input::collect(form.smiles.as_deref(), form.file.as_deref(), column)?;
        let batch = retpredict::predict(&worker.model, &smiles)?;
        let label = worker.model.target().unwrap_or(export::DEFAULT_LABEL);
        let csv = export::predictions_to_string(column, label, &batch.predictions)?;
        Ok((csv, batch.predictions.len(), batch.skipped.len()))
    })
    .await;

    match result {
        Ok(Ok((csv, predicted, skipped))) => {
            info!("returning {predicted} predictions, {skipped} skipped");
            let disposition =
                format!("attachment; filename=\"{}\"", state.config.output_file);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
                    (header::CONTENT_DISPOSITION, disposition),
                    (SKIPPED_HEADER, skipped.to_string()),
                ],
                csv,
            )
                .into_response()
        }
        Ok(Err(e)) if e.is_input_error() => {
            let status = match e {
                Error::NoInput => StatusCode::BAD_REQUEST,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            warn!("rejected submission: {e}");
            page(&state, status, Some(e.to_string()))
        }
        Ok(Err(e)) => {
            error!("prediction failed: {e}");
            page(&state, StatusCode::INTERNAL_SERVER_ERROR, Some(e.to_string()))
        }
        Err(e) => {
            error!("prediction task failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
