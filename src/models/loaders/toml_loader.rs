use crate::error::{AppError, AppResult, ConfigError};
use crate::models::grade::GradeLevel;
use crate::models::worksheet::GenerationRequestParams;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// 请求文件内容
///
/// ```toml
/// grade = "2nd Grade"
/// subject = "Science"
/// topic = "The Solar System"
/// details = "Focus on the planets"
/// ```
#[derive(Debug, Deserialize)]
struct RequestFile {
    grade: Option<String>,
    subject: Option<String>,
    topic: String,
    details: Option<String>,
}

/// 从 TOML 文件加载生成请求
pub async fn load_request_file(path: &Path) -> AppResult<GenerationRequestParams> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file(path.display().to_string(), e))?;

    let params = parse_request(&content, &path.display().to_string())?;
    info!(
        "成功加载请求: {} / {} / {}",
        params.grade, params.subject, params.topic
    );

    Ok(params)
}

/// 解析请求文件内容，缺省的年级和科目取表单默认值
pub fn parse_request(content: &str, source_name: &str) -> Result<GenerationRequestParams, ConfigError> {
    let file: RequestFile =
        toml::from_str(content).map_err(|e| ConfigError::RequestFileInvalid {
            path: source_name.to_string(),
            source: e,
        })?;

    let topic = file.topic.trim().to_string();
    if topic.is_empty() {
        return Err(ConfigError::EmptyField {
            field: "topic".to_string(),
        });
    }

    let defaults = GenerationRequestParams::default();
    let grade = file
        .grade
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .unwrap_or(defaults.grade);

    if GradeLevel::from_str(&grade).is_none() {
        warn!("⚠️ 年级 '{}' 不在预设列表中，按自由输入处理", grade);
    }

    Ok(GenerationRequestParams {
        grade,
        subject: file
            .subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.subject),
        topic,
        details: file.details.unwrap_or_default(),
    })
}
