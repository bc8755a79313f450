use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::pipeline::{RequestDescriptor, RequestPipeline};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub email: String,
}

pub async fn get_teacher_list(pipeline: &RequestPipeline) -> Result<Vec<Teacher>, PipelineError> {
    pipeline.execute_as(&RequestDescriptor::get("/api/teacher/list")).await
}
