//! 整文件“训练方法”预筛（Aho-Corasick）
//!
//! 消费者交叉校验使用的粗粒度判定：文件导入了生产者词典中的库，
//! 且全文任意位置（区分大小写的子串，不按行、不走正则）出现该库的任一生产者关键字。
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use std::collections::HashMap;

use crate::dictionary::LibraryKeywordDictionary;
use crate::error::{Result, ScanError};
use crate::imports::ImportSet;

/// 由生产者词典构建的关键字自动机
pub struct TrainingMethodIndex {
    /// 全部生产者关键字（去重，按词典顺序）
    ac: AhoCorasick,
    /// 关键字索引 -> 声明该关键字的库（可能多个）
    keyword_to_libraries: Vec<Vec<String>>,
}

impl TrainingMethodIndex {
    pub fn build(producer: &LibraryKeywordDictionary) -> Result<Self> {
        let mut keywords: Vec<&str> = Vec::new();
        let mut keyword_index: HashMap<&str, usize> = HashMap::new();
        let mut keyword_to_libraries: Vec<Vec<String>> = Vec::new();

        for entry in producer.entries() {
            let id = *keyword_index.entry(entry.keyword.as_str()).or_insert_with(|| {
                keywords.push(entry.keyword.as_str());
                keyword_to_libraries.push(Vec::new());
                keywords.len() - 1
            });
            if !keyword_to_libraries[id].contains(&entry.library) {
                keyword_to_libraries[id].push(entry.library.clone());
            }
        }

        // 需要重叠匹配，必须使用 Standard 语义
        let ac = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(&keywords)
            .map_err(|e| ScanError::InvalidDictionary {
                path: Default::default(),
                message: format!("cannot build producer keyword automaton: {e}"),
            })?;

        Ok(Self { ac, keyword_to_libraries })
    }

    /// 文件是否满足整文件训练方法判定
    pub fn file_trains_model(&self, imports: &ImportSet, text: &str) -> bool {
        if imports.is_empty() {
            return false;
        }
        self.ac.find_overlapping_iter(text).any(|m| {
            self.keyword_to_libraries[m.pattern().as_usize()]
                .iter()
                .any(|lib| imports.contains(lib))
        })
    }
}
