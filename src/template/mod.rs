//! 发票行描述模板
//!
//! 模板按名称 (去掉后缀的文件名) 注册, 名称即冒号分隔的层级键,
//! 例如 `kafka` 与 `kafka:exoscale:*:*:premium-30x-33`。
//! 以 `_` 开头的条目只作为 partial 注册, 供其他模板通过 `{{> _name}}` 引用。

pub mod helpers;
pub mod source;

use std::collections::BTreeSet;
use std::path::Path;

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::TemplateError;
use crate::models::Item;

pub use source::{DirSource, MemorySource, TemplateSource};

/// 层级键模板渲染器, 加载后只读
#[derive(Debug)]
pub struct DescriptionRenderer {
    registry: Handlebars<'static>,
    keys: BTreeSet<String>,
}

impl DescriptionRenderer {
    /// 从模板来源加载所有以 `suffix` 结尾的条目
    pub fn load<S: TemplateSource + ?Sized>(source: &S, suffix: &str) -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        helpers::register(&mut registry);

        let mut keys = BTreeSet::new();
        for file_name in source.list(suffix)? {
            let content = source.read(&file_name)?;
            let name = file_name
                .strip_suffix(suffix)
                .unwrap_or(&file_name)
                .to_string();
            let syntax_err = |e: handlebars::TemplateError| TemplateError::Syntax {
                name: file_name.clone(),
                source: Box::new(e),
            };

            if name.starts_with('_') {
                registry
                    .register_partial(&name, content)
                    .map_err(syntax_err)?;
            } else {
                registry
                    .register_template_string(&name, content)
                    .map_err(syntax_err)?;
                keys.insert(name);
            }
        }

        tracing::info!("已加载 {} 个描述模板", keys.len());
        Ok(Self { registry, keys })
    }

    pub fn from_dir(path: impl AsRef<Path>, suffix: &str) -> Result<Self, TemplateError> {
        Self::load(&DirSource::new(path.as_ref()), suffix)
    }

    /// 已注册的模板名 (不含 partial)
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// 最长前缀匹配: 依次尝试前 N..1 个冒号分段拼接出的名称
    pub fn resolve(&self, key: &str) -> Option<String> {
        let segments: Vec<&str> = key.split(':').collect();
        (1..=segments.len())
            .rev()
            .map(|n| segments[..n].join(":"))
            .find(|candidate| self.keys.contains(candidate))
    }

    pub fn render<T: Serialize>(&self, key: &str, context: &T) -> Result<String, TemplateError> {
        let name = self.resolve(key).ok_or_else(|| TemplateError::NotFound {
            key: key.to_string(),
            defined: self.keys.iter().cloned().collect(),
        })?;
        tracing::debug!("render description: {} -> {}", key, name);

        self.registry
            .render(&name, context)
            .map_err(|e| TemplateError::Render {
                name,
                source: Box::new(e),
            })
    }
}

/// 发票行描述渲染接口
pub trait ItemDescriptionRenderer: Send + Sync {
    fn render_item_description(&self, item: &Item) -> Result<String, TemplateError>;
}

/// 以 `product_ref.source` 为键选择模板
impl ItemDescriptionRenderer for DescriptionRenderer {
    fn render_item_description(&self, item: &Item) -> Result<String, TemplateError> {
        self.render(&item.product_ref.source, item)
    }
}

/// 未配置模板时的回退: 输出条目的调试格式
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugDescriptionRenderer;

impl ItemDescriptionRenderer for DebugDescriptionRenderer {
    fn render_item_description(&self, item: &Item) -> Result<String, TemplateError> {
        Ok(format!("{item:?}"))
    }
}
