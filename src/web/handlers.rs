use crate::{
    classify::{ClassificationPipeline, ClassificationReport},
    image::ImageLoader,
    lookup::{LookupErrorKind, Summary, AMBIGUOUS_MESSAGE, NOT_FOUND_MESSAGE},
    utils::error::ClassifyError,
    web::{
        extractors::{RequestId, ValidatedJson},
        AppState,
    },
    Result,
};
use axum::{
    extract::{Multipart, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// 查询字符串长度上限（MediaWiki srsearch 限制）
const MAX_QUERY_CHARS: usize = 300;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct ClassifyJsonRequest {
    /// Base64编码的图像数据，可带 data URL 前缀
    pub image: String,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// JSON base64上传处理器
pub async fn classify_json_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<ClassifyJsonRequest>,
) -> Result<Json<ApiResponse<ClassificationReport>>> {
    let start_time = Instant::now();

    tracing::info!(
        "Processing JSON classify request: request_id={}, payload={} chars",
        request_id,
        request.image.len()
    );

    let report = ClassificationPipeline::process_base64(state.registry.clone(), request.image).await?;

    tracing::info!(
        "JSON classify completed: request_id={}, time={:.3}s",
        request_id,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(report, request_id)))
}

/// Multipart文件上传处理器
pub async fn classify_upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ClassificationReport>>> {
    let start_time = Instant::now();

    tracing::info!("Processing multipart classify request: request_id={}", request_id);

    let mut image_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ClassifyError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "file" => {
                // 验证内容类型：只接受 JPEG / PNG
                if let Some(content_type) = field.content_type() {
                    if !ImageLoader::is_supported_mime(content_type) {
                        return Err(ClassifyError::UnsupportedFormat(content_type.to_string()));
                    }
                }

                let data = field.bytes().await.map_err(|e| {
                    ClassifyError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;

                if data.is_empty() {
                    return Err(ClassifyError::InvalidInput("Empty file".to_string()));
                }

                tracing::debug!("Received file: {} bytes", data.len());
                image_data = Some(data.to_vec());
            }
            _ => {
                tracing::debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let image_data = image_data
        .ok_or_else(|| ClassifyError::InvalidInput("No image file provided".to_string()))?;

    let report = ClassificationPipeline::process_bytes(state.registry.clone(), image_data).await?;

    tracing::info!(
        "Upload classify completed: request_id={}, time={:.3}s",
        request_id,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(report, request_id)))
}

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupResponse {
    Found { title: String, summary: String },
    Ambiguous { message: &'static str },
    NotFound { message: &'static str },
}

/// 百科摘要查询
pub async fn lookup_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    Query(params): Query<LookupParams>,
) -> Result<Json<ApiResponse<LookupResponse>>> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(ClassifyError::InvalidInput("Query cannot be empty".to_string()));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(ClassifyError::InvalidInput(format!(
            "Query too long, maximum {} characters",
            MAX_QUERY_CHARS
        )));
    }

    tracing::info!("Processing lookup: request_id={}, query='{}'", request_id, query);

    let response = match state.lookup.summary(query).await {
        Ok(Summary { title, text }) => LookupResponse::Found {
            title,
            summary: text,
        },
        Err(e) => match e.kind() {
            LookupErrorKind::Ambiguous => {
                tracing::info!("Lookup ambiguous: request_id={}, {}", request_id, e);
                LookupResponse::Ambiguous {
                    message: AMBIGUOUS_MESSAGE,
                }
            }
            LookupErrorKind::NotFound => {
                tracing::info!("Lookup not found: request_id={}, {}", request_id, e);
                LookupResponse::NotFound {
                    message: NOT_FOUND_MESSAGE,
                }
            }
            LookupErrorKind::Other => return Err(ClassifyError::Lookup(e.to_string())),
        },
    };

    Ok(Json(ApiResponse::success(response, request_id)))
}
