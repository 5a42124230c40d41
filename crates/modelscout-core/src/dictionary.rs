//! 库-关键字词典加载（CSV / TOML）
//!
//! 每次运行加载一次，之后只读。每行关键字在加载时即编译为行级正则，
//! 并按库名建立索引。
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::warn;

use crate::error::{Result, ScanError};
use crate::imports::ImportSet;
use crate::matcher::keyword_pattern;

/// 词典中的一行
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryKeywordEntry {
    pub library: String,
    #[serde(alias = "Keyword")]
    pub keyword: String,
}

impl LibraryKeywordEntry {
    pub fn new(library: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self { library: library.into(), keyword: keyword.into() }
    }
}

/// TOML 词典文件结构
#[derive(Debug, Clone, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    entries: Vec<LibraryKeywordEntry>,
}

/// 编译后的词典行
#[derive(Debug, Clone)]
pub struct DictionaryEntry {
    pub library: String,
    /// 原样保留的关键字字面量
    pub keyword: String,
    pub(crate) pattern: Regex,
}

/// 不可变的词典索引
#[derive(Debug, Clone, Default)]
pub struct LibraryKeywordDictionary {
    entries: Vec<DictionaryEntry>,
    by_library: HashMap<String, Vec<usize>>,
}

impl LibraryKeywordDictionary {
    /// 按扩展名选择解析方式：`.toml` 走 TOML，其余按 CSV
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ScanError::MissingDictionary(path.to_path_buf()));
        }
        let rows = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => read_toml_rows(path)?,
            _ => read_csv_rows(path)?,
        };
        Self::from_entries(rows).map_err(|e| match e {
            ScanError::InvalidDictionary { message, .. } => {
                ScanError::InvalidDictionary { path: path.to_path_buf(), message }
            }
            other => other,
        })
    }

    /// 由内存中的行构建；空库名/空关键字的行跳过
    pub fn from_entries(rows: Vec<LibraryKeywordEntry>) -> Result<Self> {
        let mut dict = Self::default();
        let mut seen_keywords: HashMap<String, String> = HashMap::new();

        for row in rows {
            let library = row.library.trim().to_string();
            if library.is_empty() || row.keyword.trim().is_empty() {
                warn!(library = %row.library, keyword = %row.keyword, "skipping incomplete dictionary row");
                continue;
            }
            match seen_keywords.get(&row.keyword) {
                Some(first) if *first != library => {
                    warn!(keyword = %row.keyword, first = %first, duplicate = %library,
                        "keyword listed under more than one library; first row wins");
                }
                Some(_) => {}
                None => {
                    seen_keywords.insert(row.keyword.clone(), library.clone());
                }
            }

            let pattern = keyword_pattern(&row.keyword).map_err(|e| ScanError::InvalidDictionary {
                path: Default::default(),
                message: format!("keyword {:?}: {e}", row.keyword),
            })?;
            let idx = dict.entries.len();
            dict.by_library.entry(library.clone()).or_default().push(idx);
            dict.entries.push(DictionaryEntry { library, keyword: row.keyword, pattern });
        }

        Ok(dict)
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 是否有任一词典库出现在导入集合中
    pub fn is_relevant(&self, imports: &ImportSet) -> bool {
        self.by_library.keys().any(|lib| imports.contains(lib))
    }

    /// 候选关键字：库被导入的行，保持词典顺序；
    /// 同一关键字只保留第一行，因此库归属取“第一条匹配行”
    pub fn candidates(&self, imports: &ImportSet) -> Vec<&DictionaryEntry> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.entries
            .iter()
            .filter(|e| imports.contains(&e.library))
            .filter(|e| seen.insert(e.keyword.as_str()))
            .collect()
    }

    /// 按关键字字面量查找第一行
    pub fn first_library_for(&self, keyword: &str) -> Option<&str> {
        self.entries.iter().find(|e| e.keyword == keyword).map(|e| e.library.as_str())
    }
}

fn read_toml_rows(path: &Path) -> Result<Vec<LibraryKeywordEntry>> {
    let txt = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
    let parsed: DictionaryFile = toml::from_str(&txt).map_err(|e| ScanError::InvalidDictionary {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(parsed.entries)
}

/// CSV 列：`library`, `Keyword`（表头大小写不敏感），其余列忽略
fn read_csv_rows(path: &Path) -> Result<Vec<LibraryKeywordEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ScanError::csv(path, e))?;
    let headers = reader.headers().map_err(|e| ScanError::csv(path, e))?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    let (lib_col, kw_col) = match (column("library"), column("keyword")) {
        (Some(l), Some(k)) => (l, k),
        _ => {
            return Err(ScanError::InvalidDictionary {
                path: path.to_path_buf(),
                message: "expected columns `library` and `Keyword`".to_string(),
            })
        }
    };

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ScanError::csv(path, e))?;
        let library = record.get(lib_col).unwrap_or_default();
        let keyword = record.get(kw_col).unwrap_or_default();
        out.push(LibraryKeywordEntry::new(library, keyword));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_headers_match_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.csv");
        std::fs::write(&path, "library,Keyword,note\nsklearn,.fit(,train\ntorch,.backward(,\n").unwrap();

        let d = LibraryKeywordDictionary::load(&path).unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(d.entries()[1].library, "torch");
        assert_eq!(d.entries()[1].keyword, ".backward(");
    }

    #[test]
    fn toml_dictionary_is_supported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.toml");
        std::fs::write(
            &path,
            "[[entries]]\nlibrary = \"keras\"\nkeyword = \"model.fit(\"\n\n[[entries]]\nlibrary = \"keras\"\nKeyword = \"model.save(\"\n",
        )
        .unwrap();

        let d = LibraryKeywordDictionary::load(&path).unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(d.first_library_for("model.save("), Some("keras"));
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = LibraryKeywordDictionary::load(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ScanError::MissingDictionary(_)));
    }

    #[test]
    fn missing_columns_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.csv");
        std::fs::write(&path, "lib,kw\nsklearn,.fit(\n").unwrap();
        assert!(matches!(
            LibraryKeywordDictionary::load(&path),
            Err(ScanError::InvalidDictionary { .. })
        ));
    }

    #[test]
    fn duplicate_keyword_resolves_to_first_row() {
        let d = LibraryKeywordDictionary::from_entries(vec![
            LibraryKeywordEntry::new("keras", ".fit("),
            LibraryKeywordEntry::new("sklearn", ".fit("),
            LibraryKeywordEntry::new("", ".train("),
        ])
        .unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(d.first_library_for(".fit("), Some("keras"));

        // 只导入 sklearn 时，候选行中的第一行是 sklearn
        let imports = ImportSet::from_tokens(["sklearn"]);
        let c = d.candidates(&imports);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].library, "sklearn");

        let both = ImportSet::from_tokens(["sklearn", "keras"]);
        let c = d.candidates(&both);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].library, "keras");
    }
}
