use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 报表库分类 (categories 表), 同步的权威数据源
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    /// 层级键, 例如 "zone:namespace"
    pub source: String,
    /// Odoo 分配的数字 ID, 未同步前为空
    pub target: Option<String>,
}

impl Category {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// 已关联的 target; 空字符串视为未关联
    pub fn linked_target(&self) -> Option<&str> {
        self.target.as_deref().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_target_is_unlinked() {
        assert_eq!(Category::new("zone:ns").linked_target(), None);
        assert_eq!(Category::new("zone:ns").with_target("").linked_target(), None);
        assert_eq!(Category::new("zone:ns").with_target("12").linked_target(), Some("12"));
    }
}
