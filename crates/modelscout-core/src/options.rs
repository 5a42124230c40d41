//! 扫描选项与统计信息（模块）
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};

/// 分类规则开关
/// - cross_check：消费者命中需通过整文件“训练方法”反查
/// - file_filter：消费者扫描跳过 test/example/eval/validat 命名的文件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleFlags {
    pub cross_check: bool,
    pub file_filter: bool,
}

impl Default for RuleFlags {
    fn default() -> Self {
        Self { cross_check: true, file_filter: true }
    }
}

/// 扫描选项（可由 TOML 配置文件加载，命令行参数覆盖）
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanOptions {
    /// 生产者词典（CSV 或 TOML）
    pub producer_dictionary: PathBuf,
    /// 消费者词典（CSV 或 TOML）
    pub consumer_dictionary: PathBuf,
    /// 输出目录：其下为 Producers/ 与 Consumers/
    pub output_dir: PathBuf,
    pub rules: RuleFlags,
    /// 参与扫描的文件扩展名（不含点）
    pub extensions: Vec<String>,
    /// 消费者文件过滤使用的子串（大小写不敏感）
    pub filter_substrings: Vec<String>,
    /// 为零命中项目写入 "No" 标记行，使其在续跑时被跳过
    pub mark_empty_projects: bool,
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            producer_dictionary: PathBuf::from("./dictionaries/library_dict_producers.csv"),
            consumer_dictionary: PathBuf::from("./dictionaries/library_dict_consumers.csv"),
            output_dir: PathBuf::from("./output"),
            rules: RuleFlags::default(),
            extensions: vec!["py".to_string(), "ipynb".to_string()],
            filter_substrings: ["test", "example", "eval", "validat"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mark_empty_projects: false,
            max_file_size: None,
        }
    }
}

impl ScanOptions {
    /// 从 TOML 配置文件加载；缺省字段取默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let txt = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
        toml::from_str(&txt).map_err(|e| ScanError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// 某角色的输出子目录
    pub fn role_dir(&self, role: crate::types::Role) -> PathBuf {
        self.output_dir.join(role.dir_name())
    }
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanStats {
    pub projects_seen: usize,
    pub projects_scanned: usize,
    /// 两种类型均已在累计表中，整体跳过
    pub projects_skipped: usize,
    pub files_scanned: usize,
    pub files_unreadable: usize,
    pub producer_detections: usize,
    pub consumer_detections: usize,
}
