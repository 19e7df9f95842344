//! 学习单文档模型
//!
//! 结构服务的回复先按强类型解析，再做一次结构校验，绝不直接信任原始 JSON。

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StructureGenerationError;

/// 段落类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Text,
    Question,
    Image,
    Activity,
}

/// 学习单中的一个段落
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// 文档内唯一
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub title: Option<String>,
    pub content: Option<String>,
    pub items: Option<Vec<String>>,
    // 以下字段只对 Image 类型有意义
    pub image_description: Option<String>,
    pub image_url: Option<String>,
    pub is_generating_image: bool,
}

impl Section {
    pub fn new(id: impl Into<String>, kind: SectionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            title: None,
            content: None,
            items: None,
            image_description: None,
            image_url: None,
            is_generating_image: false,
        }
    }

    /// 是否需要发起插图请求：Image 类型且描述非空
    pub fn needs_illustration(&self) -> bool {
        self.kind == SectionKind::Image
            && self
                .image_description
                .as_deref()
                .is_some_and(|d| !d.trim().is_empty())
    }
}

/// 学习单文档
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetDocument {
    pub title: String,
    pub grade_level: String,
    pub subject: String,
    pub sections: Vec<Section>,
}

impl WorksheetDocument {
    /// 解析结构服务的原始回复
    pub fn from_reply(reply: &str) -> Result<Self, StructureGenerationError> {
        let body = strip_code_fence(reply);
        if body.trim().is_empty() {
            return Err(StructureGenerationError::schema("回复内容为空"));
        }

        let raw: RawWorksheet = serde_json::from_str(body)?;
        raw.into_document()
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// 需要插图的段落 (id, 描述)，按文档顺序
    pub fn illustration_targets(&self) -> Vec<(String, String)> {
        self.sections
            .iter()
            .filter(|s| s.needs_illustration())
            .filter_map(|s| {
                s.image_description
                    .as_ref()
                    .map(|d| (s.id.clone(), d.clone()))
            })
            .collect()
    }

    /// 标记所有待生成插图的段落，返回标记数量
    pub fn mark_pending_illustrations(&mut self) -> usize {
        let mut count = 0;
        for section in self.sections.iter_mut() {
            section.is_generating_image = section.needs_illustration();
            if section.is_generating_image {
                count += 1;
            }
        }
        count
    }

    /// 仍在生成插图的段落数量
    pub fn image_sections_pending(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| s.is_generating_image)
            .count()
    }
}

/// 生成请求参数（来自表单）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequestParams {
    pub grade: String,
    pub subject: String,
    pub topic: String,
    pub details: String,
}

impl GenerationRequestParams {
    pub fn new(
        grade: impl Into<String>,
        subject: impl Into<String>,
        topic: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            grade: grade.into(),
            subject: subject.into(),
            topic: topic.into(),
            details: details.into(),
        }
    }
}

impl Default for GenerationRequestParams {
    fn default() -> Self {
        Self::new("2nd Grade", "Science", "The Solar System", "")
    }
}

// ========== 原始回复结构 ==========

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWorksheet {
    title: String,
    grade_level: String,
    subject: String,
    sections: Vec<RawSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSection {
    id: String,
    #[serde(rename = "type")]
    kind: SectionKind,
    title: Option<String>,
    content: Option<String>,
    items: Option<Vec<String>>,
    image_description: Option<String>,
}

impl RawWorksheet {
    fn into_document(self) -> Result<WorksheetDocument, StructureGenerationError> {
        let mut seen = HashSet::new();
        let mut sections = Vec::with_capacity(self.sections.len());

        for (index, raw) in self.sections.into_iter().enumerate() {
            let id = raw.id.trim().to_string();
            if id.is_empty() {
                return Err(StructureGenerationError::schema(format!(
                    "第 {} 个段落缺少 id",
                    index + 1
                )));
            }
            if !seen.insert(id.clone()) {
                return Err(StructureGenerationError::schema(format!(
                    "段落 id 重复: {}",
                    id
                )));
            }

            sections.push(Section {
                id,
                kind: raw.kind,
                title: raw.title,
                content: raw.content,
                items: raw.items,
                image_description: raw.image_description,
                image_url: None,
                is_generating_image: false,
            });
        }

        Ok(WorksheetDocument {
            title: self.title,
            grade_level: self.grade_level,
            subject: self.subject,
            sections,
        })
    }
}

/// 去掉模型偶尔包裹的 ```json 代码块
fn strip_code_fence(reply: &str) -> &str {
    if let Ok(re) = Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$") {
        if let Some(inner) = re.captures(reply).and_then(|c| c.get(1)) {
            return inner.as_str();
        }
    }
    reply
}
