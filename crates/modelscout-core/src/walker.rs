//! 单项目遍历：逐文件应用分类规则，汇总证据并写出单项目结果表
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::classify::ClassificationRules;
use crate::error::{Result, ScanError};
use crate::imports::ImportSet;
use crate::options::ScanOptions;
use crate::source::SourceFile;
use crate::store::write_table;
use crate::types::{Detection, ProjectClassification, ProjectId, ResultRecord, Role};

/// 单个项目的遍历结果
#[derive(Debug, Clone, Default)]
pub struct WalkOutcome {
    pub classification: ProjectClassification,
    pub files_scanned: usize,
    pub files_unreadable: usize,
    /// 写出的单项目结果文件
    pub written: Vec<PathBuf>,
}

/// 把命中转换为结果表行
pub fn records_for(project_name: &str, detections: &[Detection]) -> Vec<ResultRecord> {
    detections.iter().map(|d| ResultRecord::from_detection(project_name, d)).collect()
}

pub struct ProjectWalker<'a> {
    rules: &'a ClassificationRules<'a>,
    options: &'a ScanOptions,
}

impl<'a> ProjectWalker<'a> {
    pub fn new(rules: &'a ClassificationRules<'a>, options: &'a ScanOptions) -> Self {
        Self { rules, options }
    }

    /// 是否为参与扫描的源码/笔记本脚本文件
    fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.options.extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    fn too_large(&self, path: &Path) -> bool {
        match (self.options.max_file_size, std::fs::metadata(path)) {
            (Some(max), Ok(md)) => md.len() > max,
            _ => false,
        }
    }

    /// 遍历项目根目录，只运行 `passes` 中列出的类型。
    /// 根目录缺失是致命错误；单文件问题记录后跳过。
    pub fn walk(&self, root: &Path, project: &ProjectId, passes: &[Role]) -> Result<WalkOutcome> {
        if !root.is_dir() {
            return Err(ScanError::MissingProjectRoot(root.to_path_buf()));
        }
        let name = project.name();
        let mut outcome = WalkOutcome { classification: ProjectClassification::new(&name), ..Default::default() };

        // 按文件名排序，保证输出顺序可复现
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    // 失效链接等：源文件计为不可读，其余只记录
                    if e.path().is_some_and(|p| self.is_source_file(p)) {
                        outcome.files_unreadable += 1;
                    }
                    warn!(project = %name, error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.is_source_file(entry.path()) {
                continue;
            }
            let path = entry.path();
            if self.too_large(path) {
                debug!(path = %path.display(), "skipping file above size limit");
                continue;
            }
            let file = match SourceFile::read(path) {
                Some(f) => f,
                None => {
                    outcome.files_unreadable += 1;
                    continue;
                }
            };
            outcome.files_scanned += 1;
            let imports = ImportSet::from_source(&file);

            for &role in passes {
                let found = match role {
                    Role::Producer => self.rules.producer_detections(&file, &imports),
                    Role::Consumer if self.rules.accepts_for_consumer(path) => {
                        self.rules.consumer_detections(&file, &imports)
                    }
                    Role::Consumer => {
                        debug!(path = %path.display(), "file name filtered from consumer pass");
                        continue;
                    }
                };
                if !found.is_empty() {
                    info!(
                        project = %name,
                        path = %path.display(),
                        role = %role,
                        keywords = ?found.iter().map(|d| d.keyword.as_str()).collect::<Vec<_>>(),
                        "ml keywords found"
                    );
                }
                outcome.classification.push(role, found);
            }
        }

        for &role in passes {
            let detections = outcome.classification.detections(role);
            if detections.is_empty() {
                continue;
            }
            let dir = self.options.role_dir(role);
            std::fs::create_dir_all(&dir).map_err(|e| ScanError::io(&dir, e))?;
            let path = dir.join(role.project_file_name(project));
            write_table(&path, role, &records_for(&name, detections))?;
            outcome.written.push(path);
        }

        Ok(outcome)
    }
}
