//! 与人工标注（oracle）对照的评估指标
//!
//! oracle CSV 需包含 `ProjectName` 与 `Is_Real_ML_<role>`（Yes/No）两列。
//! 项目在该类型累计表中存在 "Yes" 行即视为预测为 Yes。
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Result, ScanError};
use crate::store::read_table;
use crate::types::{ResultRecord, Role};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub role: Option<Role>,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    /// 分母为零时为 None
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    pub accuracy: Option<f64>,
    pub false_positive_projects: Vec<String>,
    pub false_negative_projects: Vec<String>,
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

/// 根据 oracle 标注与预测为 Yes 的项目集合计算指标
pub fn score(oracle: &[(String, bool)], predicted: &HashSet<String>) -> Evaluation {
    let mut ev = Evaluation::default();
    for (project, real) in oracle {
        match (*real, predicted.contains(project)) {
            (true, true) => ev.true_positives += 1,
            (false, true) => {
                ev.false_positives += 1;
                ev.false_positive_projects.push(project.clone());
            }
            (false, false) => ev.true_negatives += 1,
            (true, false) => {
                ev.false_negatives += 1;
                ev.false_negative_projects.push(project.clone());
            }
        }
    }
    let (tp, fp, tn, fn_) = (ev.true_positives, ev.false_positives, ev.true_negatives, ev.false_negatives);
    ev.precision = ratio(tp, tp + fp);
    ev.recall = ratio(tp, tp + fn_);
    ev.f1 = match (ev.precision, ev.recall) {
        (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
        _ => None,
    };
    ev.accuracy = ratio(tp + tn, tp + tn + fp + fn_);
    ev
}

/// 读取 oracle 文件
pub fn read_oracle(path: &Path, role: Role) -> Result<Vec<(String, bool)>> {
    let invalid = |message: String| ScanError::InvalidOracle { path: path.to_path_buf(), message };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ScanError::csv(path, e))?;
    let headers = reader.headers().map_err(|e| ScanError::csv(path, e))?.clone();
    let label = format!("Is_Real_ML_{}", role.as_str());
    let project_col = headers.iter().position(|h| h.trim() == "ProjectName");
    let label_col = headers.iter().position(|h| h.trim().eq_ignore_ascii_case(&label));
    let (project_col, label_col) = match (project_col, label_col) {
        (Some(p), Some(l)) => (p, l),
        _ => return Err(invalid(format!("expected columns `ProjectName` and `{label}`"))),
    };

    let mut out = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ScanError::csv(path, e))?;
        let project = record.get(project_col).unwrap_or_default().trim();
        if project.is_empty() {
            continue;
        }
        let value = record.get(label_col).unwrap_or_default().trim();
        let real = if value.eq_ignore_ascii_case("yes") {
            true
        } else if value.eq_ignore_ascii_case("no") {
            false
        } else {
            return Err(invalid(format!("row {}: expected Yes/No, got {value:?}", idx + 2)));
        };
        out.push((project.to_string(), real));
    }
    Ok(out)
}

/// 对照输出目录中的累计表评估某一类型
pub fn evaluate_output(output_dir: &Path, oracle_path: &Path, role: Role) -> Result<Evaluation> {
    let oracle = read_oracle(oracle_path, role)?;
    let table = output_dir.join(role.dir_name()).join(role.cumulative_file_name());
    let rows: Vec<ResultRecord> = if table.is_file() { read_table(&table)? } else { Vec::new() };
    let predicted: HashSet<String> = rows.into_iter().filter(|r| r.flag).map(|r| r.project_name).collect();

    let mut ev = score(&oracle, &predicted);
    ev.role = Some(role);
    Ok(ev)
}
