//! 机器学习模型生产者/消费者分类核心库
//!
//! 设计要点：
//! - 只做浅层词法分析：import 抽取 + 关键字行匹配，不解析语法树、不做跨文件数据流。
//! - 文件未导入任何词典库时直接跳过逐行扫描，注释/字符串中的关键字不会误报。
//! - 消费者命中可经整文件“训练方法”反查驳回；可按文件名过滤测试/示例文件。
//! - 累计结果表只追加、每个项目落盘一次，续跑依赖 ProjectName 基线检查。
//! - 全流程串行，同一输出目录不可被并发批次共享。

mod analytics;
mod batch;
mod classify;
mod dictionary;
mod error;
mod evaluate;
mod imports;
mod matcher;
mod options;
mod prefilter;
mod source;
mod store;
mod types;
mod walker;

pub use analytics::{summarize, summarize_output, ResultSummary, RoleSummary};
pub use batch::{list_projects, run_batch, run_batch_with, BatchReport, CorpusProject, Dictionaries, ResultStores};
pub use classify::{is_filtered_file_name, ClassificationRules};
pub use dictionary::{DictionaryEntry, LibraryKeywordDictionary, LibraryKeywordEntry};
pub use error::{Result, ScanError};
pub use evaluate::{evaluate_output, read_oracle, score, Evaluation};
pub use imports::{extract_imports, import_tokens, ImportSet};
pub use matcher::{keyword_pattern, KeywordMatcher};
pub use options::{RuleFlags, ScanOptions, ScanStats};
pub use prefilter::TrainingMethodIndex;
pub use source::{SourceFile, TextEncoding};
pub use store::{read_table, write_table, ResultStore};
pub use types::{Detection, ProjectClassification, ProjectId, ResultRecord, Role};
pub use walker::{records_for, ProjectWalker, WalkOutcome};
