/// 年级预设（表单下拉选项）
///
/// 年级仍然允许自由输入，这里只是常用值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum GradeLevel {
    Kindergarten,
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    MiddleSchool,
}

impl GradeLevel {
    /// 按表单中的顺序
    pub const ALL: [GradeLevel; 8] = [
        GradeLevel::Kindergarten,
        GradeLevel::First,
        GradeLevel::Second,
        GradeLevel::Third,
        GradeLevel::Fourth,
        GradeLevel::Fifth,
        GradeLevel::Sixth,
        GradeLevel::MiddleSchool,
    ];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            GradeLevel::Kindergarten => "Kindergarten",
            GradeLevel::First => "1st Grade",
            GradeLevel::Second => "2nd Grade",
            GradeLevel::Third => "3rd Grade",
            GradeLevel::Fourth => "4th Grade",
            GradeLevel::Fifth => "5th Grade",
            GradeLevel::Sixth => "6th Grade",
            GradeLevel::MiddleSchool => "Middle School",
        }
    }

    /// 尝试从字符串解析年级（忽略大小写的精确匹配）
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|grade| grade.name().eq_ignore_ascii_case(s))
    }
}

impl Default for GradeLevel {
    fn default() -> Self {
        GradeLevel::Second
    }
}

impl std::fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(GradeLevel::from_str("2nd Grade"), Some(GradeLevel::Second));
        assert_eq!(GradeLevel::from_str("  middle school "), Some(GradeLevel::MiddleSchool));
        assert_eq!(GradeLevel::from_str("Grade 2"), None);
    }

    #[test]
    fn test_default_matches_form() {
        assert_eq!(GradeLevel::default().to_string(), "2nd Grade");
    }
}
