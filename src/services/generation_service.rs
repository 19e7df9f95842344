//! 生成服务 - 业务能力层
//!
//! 只负责"生成学习单结构"和"生成单张插图"两种能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `reqwest` 直接调用 Gemini `generateContent` REST 接口
//! - 结构请求使用 `responseSchema` 约束输出 JSON
//! - 插图请求从响应中提取第一个内联图片

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::clients::gemini_client::{
    GeminiCallError, GeminiClient, GenerateContentRequest, GenerationConfig,
};
use crate::config::Config;
use crate::error::{IllustrationGenerationError, StructureGenerationError};
use crate::models::{GenerationRequestParams, ImageRef, WorksheetDocument};

/// 插图提示词的固定风格前缀
pub const ILLUSTRATION_STYLE_PREAMBLE: &str = "Generate a black and white line art illustration suitable for a children's worksheet coloring page. No complex shading, clean lines, white background. Description: ";

/// 生成后端
///
/// 两种能力都可能失败，失败如何处理由上层决定。
#[async_trait]
pub trait GenerationBackend: Send + Sync + 'static {
    /// 生成学习单结构
    async fn generate_structure(
        &self,
        params: &GenerationRequestParams,
    ) -> Result<WorksheetDocument, StructureGenerationError>;

    /// 生成单张插图
    async fn generate_illustration(
        &self,
        description: &str,
    ) -> Result<ImageRef, IllustrationGenerationError>;
}

/// 基于 Gemini 的生成后端
pub struct GeminiBackend {
    client: GeminiClient,
    structure_model: String,
    image_model: String,
    temperature: f32,
}

impl GeminiBackend {
    /// 创建新的 Gemini 生成后端
    pub fn new(config: &Config) -> Self {
        Self {
            client: GeminiClient::new(config),
            structure_model: config.structure_model_name.clone(),
            image_model: config.image_model_name.clone(),
            temperature: config.structure_temperature,
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate_structure(
        &self,
        params: &GenerationRequestParams,
    ) -> Result<WorksheetDocument, StructureGenerationError> {
        let model = self.structure_model.as_str();
        let request = GenerateContentRequest::user_text(build_structure_prompt(params))
            .with_config(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(worksheet_schema()),
                temperature: Some(self.temperature),
            });

        let response = self
            .client
            .generate_content(model, &request)
            .await
            .map_err(|e| match e {
                GeminiCallError::Transport(source) => StructureGenerationError::RequestFailed {
                    model: model.to_string(),
                    source,
                },
                GeminiCallError::Status { status, body } => StructureGenerationError::BadStatus {
                    model: model.to_string(),
                    status,
                    body,
                },
                GeminiCallError::Decode(source) => StructureGenerationError::InvalidJson { source },
            })?;

        let text = response
            .text()
            .ok_or_else(|| StructureGenerationError::EmptyReply {
                model: model.to_string(),
            })?;

        debug!("结构回复长度: {} 字符", text.len());

        WorksheetDocument::from_reply(&text)
    }

    async fn generate_illustration(
        &self,
        description: &str,
    ) -> Result<ImageRef, IllustrationGenerationError> {
        let model = self.image_model.as_str();
        let request = GenerateContentRequest::user_text(build_illustration_prompt(description));

        let response = self
            .client
            .generate_content(model, &request)
            .await
            .map_err(|e| match e {
                GeminiCallError::Transport(source) => IllustrationGenerationError::RequestFailed {
                    model: model.to_string(),
                    source,
                },
                GeminiCallError::Status { status, body } => IllustrationGenerationError::BadStatus {
                    model: model.to_string(),
                    status,
                    body,
                },
                GeminiCallError::Decode(e) => IllustrationGenerationError::InvalidPayload {
                    reason: e.to_string(),
                },
            })?;

        let Some(inline) = response.first_inline_data() else {
            warn!(
                "插图回复中没有图片数据 (模型: {}, finishReason: {})",
                model,
                response.finish_reason().unwrap_or("未知")
            );
            return Err(IllustrationGenerationError::NoImagePayload {
                model: model.to_string(),
            });
        };

        image_from_inline(&inline.mime_type, &inline.data)
    }
}

// ========== 提示词与结构约束 ==========

/// 构建结构请求的提示词
pub fn build_structure_prompt(params: &GenerationRequestParams) -> String {
    format!(
        r#"Create a fun, educational worksheet for Grade {} students.
Subject: {}
Topic: {}
Additional Details: {}

The worksheet should be engaging and structured.
Include at least 2 requests for images (type: 'image') where illustrations would help (e.g., a diagram, a character, or a scene to color).
The image descriptions must be optimized for generating "black and white line art suitable for coloring by children".
Ensure the content is age-appropriate."#,
        params.grade, params.subject, params.topic, params.details
    )
}

/// 构建插图请求的提示词
pub fn build_illustration_prompt(description: &str) -> String {
    format!("{}{}", ILLUSTRATION_STYLE_PREAMBLE, description)
}

/// 结构服务的输出约束
pub fn worksheet_schema() -> JsonValue {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING", "description": "Creative title for the worksheet" },
            "gradeLevel": { "type": "STRING" },
            "subject": { "type": "STRING" },
            "sections": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "type": {
                            "type": "STRING",
                            "enum": ["text", "question", "image", "activity"],
                            "description": "The type of section. Use 'image' for places where an illustration would be helpful."
                        },
                        "title": { "type": "STRING", "description": "Section heading" },
                        "content": { "type": "STRING", "description": "Main text content or instruction" },
                        "items": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": "List of questions or options if applicable"
                        },
                        "imageDescription": {
                            "type": "STRING",
                            "description": "A detailed visual description for generating a black and white line-art coloring image suitable for a worksheet. Only required if type is 'image'."
                        }
                    },
                    "required": ["id", "type", "title"]
                }
            }
        },
        "required": ["title", "gradeLevel", "subject", "sections"]
    })
}

/// 校验内联图片并转换为图片引用
pub fn image_from_inline(mime_type: &str, data: &str) -> Result<ImageRef, IllustrationGenerationError> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| IllustrationGenerationError::InvalidPayload {
            reason: e.to_string(),
        })?;

    let mime_type = if mime_type.trim().is_empty() {
        "image/png"
    } else {
        mime_type
    };

    Ok(ImageRef::Generated {
        mime_type: mime_type.to_string(),
        data: data.to_string(),
    })
}
