//! 批处理主流程：遍历语料根目录下的 organization/repository，逐项目分类并累计结果
//!
//! 严格串行：一个项目完整遍历、分类并落盘后才处理下一个。
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::classify::ClassificationRules;
use crate::dictionary::LibraryKeywordDictionary;
use crate::error::{Result, ScanError};
use crate::options::{ScanOptions, ScanStats};
use crate::prefilter::TrainingMethodIndex;
use crate::store::ResultStore;
use crate::types::{ProjectClassification, ProjectId, ResultRecord, Role};
use crate::walker::{records_for, ProjectWalker};

/// 一次运行加载一次的两份词典及其预筛索引
pub struct Dictionaries {
    pub producer: LibraryKeywordDictionary,
    pub consumer: LibraryKeywordDictionary,
    pub training: TrainingMethodIndex,
}

impl Dictionaries {
    pub fn load(options: &ScanOptions) -> Result<Self> {
        let producer = LibraryKeywordDictionary::load(&options.producer_dictionary)?;
        let consumer = LibraryKeywordDictionary::load(&options.consumer_dictionary)?;
        let training = TrainingMethodIndex::build(&producer)?;
        info!(
            producer_rows = producer.len(),
            consumer_rows = consumer.len(),
            "library dictionaries loaded"
        );
        Ok(Self { producer, consumer, training })
    }
}

/// 两张累计结果表
#[derive(Debug)]
pub struct ResultStores {
    pub producer: ResultStore,
    pub consumer: ResultStore,
}

impl ResultStores {
    /// 两张表都通过校验后才创建或备份，任一表损坏时不改动磁盘
    pub fn open(options: &ScanOptions) -> Result<Self> {
        let mut stores = Self {
            producer: ResultStore::inspect(&options.role_dir(Role::Producer), Role::Producer)?,
            consumer: ResultStore::inspect(&options.role_dir(Role::Consumer), Role::Consumer)?,
        };
        for role in Role::ALL {
            stores.get_mut(role).prepare()?;
        }
        Ok(stores)
    }

    pub fn get(&self, role: Role) -> &ResultStore {
        match role {
            Role::Producer => &self.producer,
            Role::Consumer => &self.consumer,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut ResultStore {
        match role {
            Role::Producer => &mut self.producer,
            Role::Consumer => &mut self.consumer,
        }
    }
}

/// 批处理结果
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub stats: ScanStats,
    /// 本次实际扫描的项目（基线检查跳过的不在其中）
    pub projects: Vec<ProjectClassification>,
    pub tables: Vec<PathBuf>,
    pub backups: Vec<PathBuf>,
}

/// 语料根目录下的一个项目
#[derive(Debug, Clone)]
pub struct CorpusProject {
    pub id: ProjectId,
    pub root: PathBuf,
}

/// 列出 `root/{organization}/{repository}`，按名称排序；非目录项忽略
pub fn list_projects(corpus_root: &Path) -> Result<Vec<CorpusProject>> {
    let mut out = Vec::new();
    let walker = WalkDir::new(corpus_root)
        .min_depth(2)
        .max_depth(2)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(corpus_root).to_path_buf();
            ScanError::io(path, e.into())
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let repo = entry.file_name().to_string_lossy().into_owned();
        let org = entry
            .path()
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        out.push(CorpusProject { id: ProjectId::new(org, repo), root: entry.into_path() });
    }
    Ok(out)
}

/// 校验配置、加载词典、打开结果表，然后处理整个语料库。
/// 配置问题在修改任何持久化状态之前返回。
pub fn run_batch(corpus_root: &Path, options: &ScanOptions) -> Result<BatchReport> {
    if !corpus_root.is_dir() {
        return Err(ScanError::MissingCorpusRoot(corpus_root.to_path_buf()));
    }
    let dictionaries = Dictionaries::load(options)?;
    let mut stores = ResultStores::open(options)?;
    run_batch_with(corpus_root, options, &dictionaries, &mut stores)
}

/// 使用调用方持有的词典与结果表处理语料库
pub fn run_batch_with(
    corpus_root: &Path,
    options: &ScanOptions,
    dictionaries: &Dictionaries,
    stores: &mut ResultStores,
) -> Result<BatchReport> {
    info!(
        corpus = %corpus_root.display(),
        cross_check = options.rules.cross_check,
        file_filter = options.rules.file_filter,
        "starting batch"
    );
    let rules = ClassificationRules::new(
        &dictionaries.producer,
        &dictionaries.consumer,
        &dictionaries.training,
        options.rules,
        &options.filter_substrings,
    );
    let walker = ProjectWalker::new(&rules, options);

    let mut report = BatchReport::default();
    for role in Role::ALL {
        let store = stores.get(role);
        report.tables.push(store.path().to_path_buf());
        report.backups.extend(store.backup_path().map(Path::to_path_buf));
    }

    for project in list_projects(corpus_root)? {
        report.stats.projects_seen += 1;
        let name = project.id.name();

        // 基线检查：已在累计表中的类型不再处理
        let passes: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|&role| !stores.get(role).contains(&name))
            .collect();
        if passes.is_empty() {
            debug!(project = %name, "already recorded, skipping");
            report.stats.projects_skipped += 1;
            continue;
        }

        info!(project = %name, passes = ?passes, "analyzing project");
        let outcome = walker.walk(&project.root, &project.id, &passes)?;
        report.stats.projects_scanned += 1;
        report.stats.files_scanned += outcome.files_scanned;
        report.stats.files_unreadable += outcome.files_unreadable;

        for &role in &passes {
            let detections = outcome.classification.detections(role);
            match role {
                Role::Producer => report.stats.producer_detections += detections.len(),
                Role::Consumer => report.stats.consumer_detections += detections.len(),
            }
            let mut records = records_for(&name, detections);
            if records.is_empty() && options.mark_empty_projects {
                records.push(ResultRecord::processed_marker(&name));
            }
            let store = stores.get_mut(role);
            store.append(records);
            store.flush()?;
        }
        report.projects.push(outcome.classification);
    }

    info!(
        projects_seen = report.stats.projects_seen,
        projects_scanned = report.stats.projects_scanned,
        projects_skipped = report.stats.projects_skipped,
        "batch finished"
    );
    Ok(report)
}
