use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- Gemini 配置 ---
    pub gemini_api_key: String,
    pub gemini_api_base_url: String,
    /// 生成文档结构所用的模型
    pub structure_model_name: String,
    /// 生成插图所用的模型
    pub image_model_name: String,
    pub structure_temperature: f32,
    // --- 插图 ---
    /// 插图失败时使用的占位图
    pub fallback_image_url: String,
    /// 单张插图的截止时间（秒），为空表示不设超时
    pub illustration_timeout_secs: Option<u64>,
    // --- 输出 ---
    /// HTML 输出目录
    pub output_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            structure_model_name: "gemini-2.5-flash".to_string(),
            image_model_name: "gemini-2.5-flash-image".to_string(),
            structure_temperature: 0.7,
            fallback_image_url: "https://picsum.photos/400/300?grayscale&blur=2".to_string(),
            illustration_timeout_secs: None,
            output_dir: "output_html".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .unwrap_or(default.gemini_api_key),
            gemini_api_base_url: std::env::var("GEMINI_API_BASE_URL").unwrap_or(default.gemini_api_base_url),
            structure_model_name: std::env::var("STRUCTURE_MODEL_NAME").unwrap_or(default.structure_model_name),
            image_model_name: std::env::var("IMAGE_MODEL_NAME").unwrap_or(default.image_model_name),
            structure_temperature: std::env::var("STRUCTURE_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.structure_temperature),
            fallback_image_url: std::env::var("FALLBACK_IMAGE_URL").unwrap_or(default.fallback_image_url),
            illustration_timeout_secs: std::env::var("ILLUSTRATION_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).or(default.illustration_timeout_secs),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 检查调用真实服务前必须具备的配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    pub fn illustration_timeout(&self) -> Option<Duration> {
        self.illustration_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_timeout() {
        let config = Config::default();
        assert!(config.illustration_timeout().is_none());
        assert_eq!(config.structure_model_name, "gemini-2.5-flash");
    }

    #[test]
    fn test_validate_requires_api_key() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));

        config.gemini_api_key = "test-key".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = Config {
            illustration_timeout_secs: Some(0),
            ..Config::default()
        };
        assert!(config.illustration_timeout().is_none());
    }
}
