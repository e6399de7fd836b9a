use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::error::TemplateError;

/// 模板来源 (目录或内存)
pub trait TemplateSource {
    /// 列出所有以 `suffix` 结尾的条目名 (含后缀), 按名称排序
    fn list(&self, suffix: &str) -> Result<Vec<String>, TemplateError>;

    fn read(&self, name: &str) -> Result<String, TemplateError>;
}

/// 从目录读取模板, 不递归子目录
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateSource for DirSource {
    fn list(&self, suffix: &str) -> Result<Vec<String>, TemplateError> {
        let io_err = |source| TemplateError::Io {
            name: self.root.display().to_string(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if !entry.file_type().map_err(io_err)?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(suffix) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<String, TemplateError> {
        fs::read_to_string(self.root.join(name)).map_err(|source| TemplateError::Io {
            name: name.to_string(),
            source,
        })
    }
}

/// 内存中的模板集合
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.entries.insert(name.into(), content.into());
        self
    }
}

impl<N: Into<String>, C: Into<String>> FromIterator<(N, C)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (N, C)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(n, c)| (n.into(), c.into()))
                .collect(),
        }
    }
}

impl TemplateSource for MemorySource {
    fn list(&self, suffix: &str) -> Result<Vec<String>, TemplateError> {
        Ok(self
            .entries
            .keys()
            .filter(|k| k.ends_with(suffix))
            .cloned()
            .collect())
    }

    fn read(&self, name: &str) -> Result<String, TemplateError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::Io {
                name: name.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such template"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_source_lists_matching_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("memory.hbs"), "m").unwrap();
        fs::write(dir.path().join("_partial.hbs"), "p").unwrap();
        fs::write(dir.path().join("README.md"), "r").unwrap();
        fs::create_dir(dir.path().join("nested.hbs")).unwrap();

        let source = DirSource::new(dir.path());

        assert_eq!(source.list(".hbs").unwrap(), vec!["_partial.hbs", "memory.hbs"]);
        assert_eq!(source.read("memory.hbs").unwrap(), "m");
        assert!(matches!(
            source.read("missing.hbs"),
            Err(TemplateError::Io { .. })
        ));
    }

    #[test]
    fn missing_dir_is_io_error() {
        let source = DirSource::new("/nonexistent/description_templates");
        assert!(matches!(source.list(".hbs"), Err(TemplateError::Io { .. })));
    }

    #[test]
    fn memory_source_filters_by_suffix() {
        let source: MemorySource = [("a.hbs", "1"), ("b.txt", "2")].into_iter().collect();
        assert_eq!(source.list(".hbs").unwrap(), vec!["a.hbs"]);
    }
}
