//! 生成客户端 - 业务能力层
//!
//! 把后端的两种能力包装成编排层需要的形态：
//! - 结构失败原样向上传播（对本次运行是致命的）
//! - 插图失败在这里被吞掉，换成通用占位图

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{IllustrationGenerationError, StructureGenerationError};
use crate::models::{GenerationRequestParams, ImageRef, WorksheetDocument};
use crate::services::generation_service::GenerationBackend;
use crate::utils::logging::truncate_text;

/// 生成客户端
pub struct GenerationClient<B> {
    backend: B,
    fallback_image_url: String,
    illustration_timeout: Option<Duration>,
}

impl<B: GenerationBackend> GenerationClient<B> {
    /// 创建新的生成客户端
    pub fn new(backend: B, config: &Config) -> Self {
        Self {
            backend,
            fallback_image_url: config.fallback_image_url.clone(),
            illustration_timeout: config.illustration_timeout(),
        }
    }

    /// 请求学习单结构，不重试
    pub async fn request_structure(
        &self,
        params: &GenerationRequestParams,
    ) -> Result<WorksheetDocument, StructureGenerationError> {
        debug!(
            "请求学习单结构: {} / {} / {}",
            params.grade, params.subject, params.topic
        );

        self.backend.generate_structure(params).await.map_err(|e| {
            error!("❌ 生成学习单结构失败: {}", e);
            e
        })
    }

    /// 请求单张插图，失败时返回占位图
    pub async fn request_illustration(&self, description: &str) -> ImageRef {
        match self.try_illustration(description).await {
            Ok(image) => image,
            Err(e) => {
                warn!(
                    "⚠️ 插图生成失败，使用占位图 ({}): {}",
                    truncate_text(description, 40),
                    e
                );
                ImageRef::Fallback {
                    url: self.fallback_image_url.clone(),
                }
            }
        }
    }

    async fn try_illustration(&self, description: &str) -> Result<ImageRef, IllustrationGenerationError> {
        match self.illustration_timeout {
            Some(limit) => tokio::time::timeout(limit, self.backend.generate_illustration(description))
                .await
                .map_err(|_| IllustrationGenerationError::TimedOut {
                    secs: limit.as_secs(),
                })?,
            None => self.backend.generate_illustration(description).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// 插图行为由描述决定的假后端
    struct ScriptedBackend;

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn generate_structure(
            &self,
            _params: &GenerationRequestParams,
        ) -> Result<WorksheetDocument, StructureGenerationError> {
            Err(StructureGenerationError::EmptyReply {
                model: "fake".to_string(),
            })
        }

        async fn generate_illustration(
            &self,
            description: &str,
        ) -> Result<ImageRef, IllustrationGenerationError> {
            match description {
                "ok" => Ok(ImageRef::Generated {
                    mime_type: "image/png".to_string(),
                    data: "AAAA".to_string(),
                }),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(ImageRef::Generated {
                        mime_type: "image/png".to_string(),
                        data: "BBBB".to_string(),
                    })
                }
                _ => Err(IllustrationGenerationError::NoImagePayload {
                    model: "fake".to_string(),
                }),
            }
        }
    }

    fn config() -> Config {
        Config {
            fallback_image_url: "https://example.test/fallback.png".to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_illustration_success_passes_through() {
        let client = GenerationClient::new(ScriptedBackend, &config());
        let image = client.request_illustration("ok").await;
        assert_eq!(image.to_url(), "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_illustration_failure_becomes_fallback() {
        let client = GenerationClient::new(ScriptedBackend, &config());
        let image = client.request_illustration("nothing").await;
        assert_eq!(
            image,
            ImageRef::Fallback {
                url: "https://example.test/fallback.png".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_illustration_timeout_becomes_fallback() {
        let config = Config {
            illustration_timeout_secs: Some(1),
            ..config()
        };
        let client = GenerationClient::new(ScriptedBackend, &config);
        let image = client.request_illustration("slow").await;
        assert!(image.is_fallback());
    }

    #[tokio::test]
    async fn test_structure_failure_propagates() {
        let client = GenerationClient::new(ScriptedBackend, &config());
        let result = client
            .request_structure(&GenerationRequestParams::default())
            .await;
        assert!(matches!(result, Err(StructureGenerationError::EmptyReply { .. })));
    }
}
