use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 结构生成错误（整次运行失败）
    #[error("结构生成错误: {0}")]
    Structure(#[from] StructureGenerationError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 结构生成错误
///
/// 对本次运行是致命的：不重试，不发布半成品文档。
#[derive(Debug, Error)]
pub enum StructureGenerationError {
    /// 网络请求失败
    #[error("结构请求失败 ({model}): {source}")]
    RequestFailed {
        model: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务返回非 2xx 状态
    #[error("结构服务返回错误状态 ({model}): status={status}, body={body}")]
    BadStatus {
        model: String,
        status: u16,
        body: String,
    },
    /// 没有可用的回复内容
    #[error("结构服务没有返回内容 ({model})")]
    EmptyReply { model: String },
    /// JSON 解析失败
    #[error("结构回复 JSON 解析失败: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
    /// JSON 合法但不符合文档结构
    #[error("结构回复不符合文档结构: {reason}")]
    SchemaViolation { reason: String },
}

impl From<serde_json::Error> for StructureGenerationError {
    fn from(err: serde_json::Error) -> Self {
        StructureGenerationError::InvalidJson { source: err }
    }
}

/// 插图生成错误
#[derive(Debug, Error)]
pub enum IllustrationGenerationError {
    /// 网络请求失败
    #[error("插图请求失败 ({model}): {source}")]
    RequestFailed {
        model: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务返回非 2xx 状态
    #[error("插图服务返回错误状态 ({model}): status={status}, body={body}")]
    BadStatus {
        model: String,
        status: u16,
        body: String,
    },
    /// 回复中没有图片数据
    #[error("回复中没有图片数据 ({model})")]
    NoImagePayload { model: String },
    /// 图片数据不是合法的 base64
    #[error("图片数据无法解码: {reason}")]
    InvalidPayload { reason: String },
    /// 超过配置的截止时间
    #[error("插图请求超时 ({secs} 秒)")]
    TimedOut { secs: u64 },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少 API Key
    #[error("缺少 API Key，请设置环境变量 GEMINI_API_KEY 或 API_KEY")]
    MissingApiKey,
    /// 请求文件解析失败
    #[error("请求文件解析失败 ({path}): {source}")]
    RequestFileInvalid {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 请求字段缺失或为空
    #[error("请求字段 {field} 不能为空")]
    EmptyField { field: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }
}

impl StructureGenerationError {
    /// 创建结构校验错误
    pub fn schema(reason: impl Into<String>) -> Self {
        StructureGenerationError::SchemaViolation {
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_error_wraps_into_app_error() {
        let err: AppError = StructureGenerationError::schema("缺少 sections").into();
        assert!(matches!(err, AppError::Structure(_)));
        assert!(err.to_string().contains("缺少 sections"));
    }

    #[test]
    fn test_json_error_maps_to_invalid_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = StructureGenerationError::from(json_err);
        assert!(matches!(err, StructureGenerationError::InvalidJson { .. }));
    }
}
