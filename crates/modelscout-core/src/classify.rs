//! 分类规则：生产者、带交叉校验的消费者、文件名过滤
use std::path::Path;
use tracing::debug;

use crate::dictionary::LibraryKeywordDictionary;
use crate::imports::ImportSet;
use crate::matcher::KeywordMatcher;
use crate::options::RuleFlags;
use crate::prefilter::TrainingMethodIndex;
use crate::source::SourceFile;
use crate::types::Detection;

/// 文件名（大小写不敏感）是否包含任一过滤子串
pub fn is_filtered_file_name(file_name: &str, substrings: &[String]) -> bool {
    let lower = file_name.to_lowercase();
    substrings.iter().any(|s| lower.contains(&s.to_lowercase()))
}

/// 一次运行内共享的分类规则
pub struct ClassificationRules<'a> {
    producer: &'a LibraryKeywordDictionary,
    consumer: &'a LibraryKeywordDictionary,
    training: &'a TrainingMethodIndex,
    flags: RuleFlags,
    filter_substrings: &'a [String],
}

impl<'a> ClassificationRules<'a> {
    pub fn new(
        producer: &'a LibraryKeywordDictionary,
        consumer: &'a LibraryKeywordDictionary,
        training: &'a TrainingMethodIndex,
        flags: RuleFlags,
        filter_substrings: &'a [String],
    ) -> Self {
        Self { producer, consumer, training, flags, filter_substrings }
    }

    /// 生产者：导入了词典库，且至少一行命中生产者关键字
    pub fn producer_detections(&self, file: &SourceFile, imports: &ImportSet) -> Vec<Detection> {
        match KeywordMatcher::for_imports(self.producer, imports) {
            Some(m) => m.scan(file),
            None => Vec::new(),
        }
    }

    /// 整文件训练方法判定（交叉校验使用）
    pub fn trains_model(&self, file: &SourceFile, imports: &ImportSet) -> bool {
        self.producer.is_relevant(imports) && self.training.file_trains_model(imports, &file.text)
    }

    /// 文件过滤开启时，名称命中过滤子串的文件不参与消费者扫描
    pub fn accepts_for_consumer(&self, path: &Path) -> bool {
        if !self.flags.file_filter {
            return true;
        }
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        !is_filtered_file_name(&name, self.filter_substrings)
    }

    /// 消费者：关键字行命中；交叉校验开启时，若同一文件满足训练方法判定则全部驳回
    pub fn consumer_detections(&self, file: &SourceFile, imports: &ImportSet) -> Vec<Detection> {
        let matcher = match KeywordMatcher::for_imports(self.consumer, imports) {
            Some(m) => m,
            None => return Vec::new(),
        };
        let raw = matcher.scan(file);
        if raw.is_empty() || !self.flags.cross_check {
            return raw;
        }
        if self.trains_model(file, imports) {
            debug!(path = %file.path.display(), rejected = raw.len(),
                "consumer matches rejected: file also trains a model");
            return Vec::new();
        }
        raw
    }
}
