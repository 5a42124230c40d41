//! 结果统计：基于两张累计表的汇总、分布与高频关键字/库
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::Result;
use crate::store::read_table;
use crate::types::{ResultRecord, Role};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleSummary {
    /// 命中行数（不含 "No" 标记行）
    pub detections: usize,
    pub projects: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSummary {
    pub producer: RoleSummary,
    pub consumer: RoleSummary,
    pub total_projects: usize,
    pub total_libraries: usize,
    /// 生产者/消费者命中行占比（百分比，保留两位小数）
    pub producer_share: f64,
    pub consumer_share: f64,
    pub top_keywords: Vec<(String, usize)>,
    pub top_libraries: Vec<(String, usize)>,
}

/// 读取输出目录下的两张累计表；不存在的表视为空
pub fn summarize_output(output_dir: &Path, top: usize) -> Result<ResultSummary> {
    let load = |role: Role| -> Result<Vec<ResultRecord>> {
        let path = output_dir.join(role.dir_name()).join(role.cumulative_file_name());
        if path.is_file() {
            read_table(&path)
        } else {
            Ok(Vec::new())
        }
    };
    Ok(summarize(&load(Role::Producer)?, &load(Role::Consumer)?, top))
}

pub fn summarize(producer: &[ResultRecord], consumer: &[ResultRecord], top: usize) -> ResultSummary {
    let producer: Vec<&ResultRecord> = producer.iter().filter(|r| r.flag).collect();
    let consumer: Vec<&ResultRecord> = consumer.iter().filter(|r| r.flag).collect();

    let projects = |rows: &[&ResultRecord]| -> BTreeSet<String> {
        rows.iter().map(|r| r.project_name.clone()).collect()
    };
    let producer_projects = projects(&producer);
    let consumer_projects = projects(&consumer);

    let mut keywords: BTreeMap<String, usize> = BTreeMap::new();
    let mut libraries: BTreeMap<String, usize> = BTreeMap::new();
    for r in producer.iter().chain(consumer.iter()) {
        let kw = r.keyword.trim();
        if !kw.is_empty() {
            *keywords.entry(kw.to_string()).or_default() += 1;
        }
        let lib = r.library.trim();
        if !lib.is_empty() {
            *libraries.entry(lib.to_string()).or_default() += 1;
        }
    }

    let total = producer.len() + consumer.len();
    let share = |n: usize| if total == 0 { 0.0 } else { (n as f64 * 10000.0 / total as f64).round() / 100.0 };

    ResultSummary {
        producer: RoleSummary { detections: producer.len(), projects: producer_projects.len() },
        consumer: RoleSummary { detections: consumer.len(), projects: consumer_projects.len() },
        total_projects: producer_projects.union(&consumer_projects).count(),
        total_libraries: libraries.len(),
        producer_share: share(producer.len()),
        consumer_share: share(consumer.len()),
        top_keywords: most_common(keywords, top),
        top_libraries: most_common(libraries, top),
    }
}

/// 频次降序，同频按名称升序
fn most_common(counts: BTreeMap<String, usize>, top: usize) -> Vec<(String, usize)> {
    let mut v: Vec<(String, usize)> = counts.into_iter().collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    v.truncate(top);
    v
}
