//! 词法级 import 抽取
//!
//! 只做浅层扫描：任何去掉前导空白后包含 `import ` 的行都视为导入语句，
//! 取第一个空格之后的词作为模块名。`import X` 与 `from X import Y` 因此一视同仁。
//! 已知不处理：别名、一行多目标（`import a, b` 得到 `a,`）、条件导入。
use std::collections::HashSet;
use std::path::Path;

use crate::source::SourceFile;

/// 从若干行中抽取原始导入词（未归一化）
pub fn import_tokens<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    for line in lines {
        let line = line.trim_start();
        if !line.contains("import ") {
            continue;
        }
        if let Some(token) = line.split(' ').nth(1) {
            out.push(token.to_string());
        }
    }
    out
}

/// 读取文件并抽取导入词；文件不可读时返回空（已记录日志）
pub fn extract_imports(path: &Path) -> Vec<String> {
    match SourceFile::read(path) {
        Some(file) => import_tokens(file.lines()),
        None => Vec::new(),
    }
}

/// 归一化：截断到第一个 "."，去掉尾部换行
pub(crate) fn normalize_module(token: &str) -> &str {
    let top = token.split('.').next().unwrap_or(token);
    top.trim_end_matches(['\n', '\r'])
}

/// 一个文件导入的顶层模块集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    modules: HashSet<String>,
}

impl ImportSet {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let modules = tokens
            .into_iter()
            .map(|t| normalize_module(t.as_ref()).to_string())
            .filter(|m| !m.is_empty())
            .collect();
        Self { modules }
    }

    pub fn from_source(file: &SourceFile) -> Self {
        Self::from_tokens(import_tokens(file.lines()))
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains(module)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }
}
