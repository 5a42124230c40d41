//! 关键字匹配器
//!
//! 每个词典关键字编译为一条行级正则：
//! - 关键字中的字面字符（含 "." 与 "("）全部转义，只匹配自身；
//! - 关键字内部空白变为 `\s*`，允许源码排版差异；
//! - 大小写不敏感。
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::dictionary::{DictionaryEntry, LibraryKeywordDictionary};
use crate::imports::ImportSet;
use crate::source::SourceFile;
use crate::types::Detection;

/// 由关键字构造行级正则
pub fn keyword_pattern(keyword: &str) -> Result<Regex, regex::Error> {
    let segments: Vec<String> = keyword.split_whitespace().map(regex::escape).collect();
    RegexBuilder::new(&segments.join(r"\s*")).case_insensitive(true).build()
}

/// 针对单个文件的候选关键字集合
pub struct KeywordMatcher<'d> {
    candidates: Vec<&'d DictionaryEntry>,
}

impl<'d> KeywordMatcher<'d> {
    /// 文件未导入任何词典库时返回 `None`，该文件不做逐行扫描
    pub fn for_imports(dictionary: &'d LibraryKeywordDictionary, imports: &ImportSet) -> Option<Self> {
        let candidates = dictionary.candidates(imports);
        if candidates.is_empty() {
            return None;
        }
        Some(Self { candidates })
    }

    /// 逐行（1 起始）测试每个候选关键字；同一行多个关键字各产生一条命中
    pub fn scan(&self, file: &SourceFile) -> Vec<Detection> {
        let mut found = Vec::new();
        for (idx, line) in file.lines().enumerate() {
            for entry in &self.candidates {
                if entry.pattern.is_match(line) {
                    found.push(Detection {
                        library: entry.library.clone(),
                        keyword: entry.keyword.clone(),
                        file_path: file.path.clone(),
                        line_number: idx + 1,
                        line_text: line.trim().to_string(),
                    });
                }
            }
        }
        if !found.is_empty() {
            debug!(path = %file.path.display(), matches = found.len(), "keyword lines matched");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::LibraryKeywordEntry;

    fn dict(rows: &[(&str, &str)]) -> LibraryKeywordDictionary {
        LibraryKeywordDictionary::from_entries(
            rows.iter().map(|(l, k)| LibraryKeywordEntry::new(*l, *k)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn dot_paren_and_gap_are_normalized() {
        let re = keyword_pattern("torch.load( map").unwrap();
        assert!(re.is_match("m = Torch.Load(   map_location='cpu')"));
        assert!(re.is_match("m = torch.load(map_location='cpu')"));
        assert!(!re.is_match("m = torchXload( map"));
        assert!(!re.is_match("m = torch.load[ map"));
    }

    #[test]
    fn other_metacharacters_are_literal() {
        let re = keyword_pattern("model.predict(*args)").unwrap();
        assert!(re.is_match("y = model.predict(*args)"));
        assert!(!re.is_match("y = model.predictttargs)"));
    }

    #[test]
    fn no_imported_library_short_circuits() {
        let d = dict(&[("sklearn", ".fit(")]);
        let imports = ImportSet::from_tokens(["os"]);
        assert!(KeywordMatcher::for_imports(&d, &imports).is_none());
    }

    #[test]
    fn scan_reports_every_keyword_on_a_line() {
        let d = dict(&[("sklearn", ".fit("), ("sklearn", ".predict(")]);
        let imports = ImportSet::from_tokens(["sklearn.svm"]);
        let m = KeywordMatcher::for_imports(&d, &imports).unwrap();
        let file = SourceFile::from_text(
            "train.py",
            "from sklearn.svm import SVC\n\n  clf.fit(X, y).predict(Z)  \n",
        );

        let found = m.scan(&file);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].keyword, ".fit(");
        assert_eq!(found[1].keyword, ".predict(");
        assert!(found.iter().all(|d| d.line_number == 3 && d.library == "sklearn"));
        assert_eq!(found[0].line_text, "clf.fit(X, y).predict(Z)");
    }
}
