use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::pipeline::{RequestDescriptor, RequestPipeline};
use crate::types::PaginationData;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub class_name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassAddRequest {
    pub class_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassEditRequest {
    pub class_name: String,
}

pub async fn add_class(pipeline: &RequestPipeline, request: &ClassAddRequest) -> Result<Class, PipelineError> {
    let descriptor = RequestDescriptor::post("/class/add").with_json(request)?;
    pipeline.execute_as(&descriptor).await
}

pub async fn edit_class(
    pipeline: &RequestPipeline,
    id: i64,
    request: &ClassEditRequest,
) -> Result<Class, PipelineError> {
    let descriptor = RequestDescriptor::put(format!("/class/{}", id)).with_json(request)?;
    pipeline.execute_as(&descriptor).await
}

pub async fn delete_class(pipeline: &RequestPipeline, id: i64) -> Result<(), PipelineError> {
    let descriptor = RequestDescriptor::delete(format!("/class/{}", id));
    pipeline.execute(&descriptor).await.map(|_| ())
}

pub async fn get_class_list(
    pipeline: &RequestPipeline,
    page: u32,
    page_size: u32,
) -> Result<PaginationData<Class>, PipelineError> {
    let descriptor = RequestDescriptor::get("/class/list")
        .with_query("page", page)
        .with_query("page_size", page_size);
    pipeline.execute_as(&descriptor).await
}
