// Text file read/replace endpoints

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, Uri, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use textfile_core::{DocumentKey, ids::FileType};

use crate::{
    AppError,
    cookies::forwarded_cookie_header,
    state::AppState,
    types::{Message, ReplaceTextFileRequest, TextFileQuery},
};

const REPLACED_DETAIL: &str = "components updated succesfully";

pub(crate) async fn get_text_file_handler(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    query: Result<Query<TextFileQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let default_file_type = names_swagger(uri.path()).then(FileType::swagger);
    let key = DocumentKey::parse(
        query.compid.as_deref(),
        query.filetype.as_deref(),
        default_file_type,
    )?;

    let cookies = forwarded_cookie_header(&headers);
    let document = state
        .text_files
        .fetch_document(&key, cookies.as_deref())
        .await?;

    Ok((
        [(CONTENT_TYPE, document.media_type.content_type())],
        document.text,
    )
        .into_response())
}

pub(crate) async fn replace_text_file_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ReplaceTextFileRequest>, JsonRejection>,
) -> Result<Json<Message>, AppError> {
    let Json(request) = payload?;
    let (key, chunks) = request.into_parts()?;

    let cookies = forwarded_cookie_header(&headers);
    state
        .text_files
        .replace_document(&key, chunks, cookies.as_deref())
        .await?;

    Ok(Json(Message {
        detail: REPLACED_DETAIL,
    }))
}

fn names_swagger(path: &str) -> bool {
    path.split('/').any(|segment| segment == FileType::SWAGGER)
}
