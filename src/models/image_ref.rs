/// 可直接显示的图片引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// 模型生成的内联图片
    Generated { mime_type: String, data: String },
    /// 生成失败时的通用占位图
    Fallback { url: String },
}

impl ImageRef {
    /// 渲染成可放进 `<img src>` 的字符串
    pub fn to_url(&self) -> String {
        match self {
            ImageRef::Generated { mime_type, data } => {
                format!("data:{};base64,{}", mime_type, data)
            }
            ImageRef::Fallback { url } => url.clone(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ImageRef::Fallback { .. })
    }
}
