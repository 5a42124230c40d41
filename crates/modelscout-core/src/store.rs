//! 累计结果表（可续跑的只追加存储）
//!
//! 每种分类类型一张表。批次开始时：表不存在则写入仅含表头的新表，
//! 已存在则先做带时间戳的备份。每个项目结束后立即追加并落盘，
//! 中断最多丢失一个项目的结果；续跑时通过 ProjectName 基线检查跳过已处理项目。
//!
//! 表没有任何锁，同一输出位置不可并发写入。
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, ScanError};
use crate::types::{ResultRecord, Role};

/// 单一类型的累计结果表
#[derive(Debug)]
pub struct ResultStore {
    role: Role,
    dir: PathBuf,
    path: PathBuf,
    projects: HashSet<String>,
    pending: Vec<ResultRecord>,
    backup: Option<PathBuf>,
}

impl ResultStore {
    /// 打开（必要时创建）`dir` 下该类型的累计表
    pub fn open(dir: &Path, role: Role) -> Result<Self> {
        let mut store = Self::inspect(dir, role)?;
        store.prepare()?;
        Ok(store)
    }

    /// 只读取已有表（若有）建立基线，不写任何文件
    pub fn inspect(dir: &Path, role: Role) -> Result<Self> {
        let path = dir.join(role.cumulative_file_name());
        let projects = if path.exists() {
            read_table(&path)?.into_iter().map(|r| r.project_name).collect()
        } else {
            HashSet::new()
        };
        Ok(Self { role, dir: dir.to_path_buf(), path, projects, pending: Vec::new(), backup: None })
    }

    /// 批次开始前的落盘准备：表不存在则写入仅含表头的新表，已存在则先备份
    pub fn prepare(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ScanError::io(&self.dir, e))?;
        if self.path.exists() {
            self.backup = Some(backup_table(&self.dir, self.role, &self.path)?);
        } else {
            write_table(&self.path, self.role, &[])?;
            info!(path = %self.path.display(), "created result table");
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 本次批次开始前做的备份（若有）
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup.as_deref()
    }

    /// 基线检查：该项目是否已有记录
    pub fn contains(&self, project_name: &str) -> bool {
        self.projects.contains(project_name)
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// 暂存记录，`flush` 后才写入磁盘
    pub fn append<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = ResultRecord>,
    {
        for r in records {
            self.projects.insert(r.project_name.clone());
            self.pending.push(r);
        }
    }

    /// 追加暂存记录并同步到磁盘，返回写入行数
    pub fn flush(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ScanError::io(&self.path, e))?;
        ensure_trailing_newline(&mut file).map_err(|e| ScanError::io(&self.path, e))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        for r in &self.pending {
            writer.write_record(r.to_row()).map_err(|e| ScanError::csv(&self.path, e))?;
        }
        writer.flush().map_err(|e| ScanError::io(&self.path, e))?;
        let file = writer
            .into_inner()
            .map_err(|e| ScanError::io(&self.path, e.into_error()))?;
        file.sync_all().map_err(|e| ScanError::io(&self.path, e))?;

        let n = self.pending.len();
        self.pending.clear();
        debug!(path = %self.path.display(), rows = n, "result table flushed");
        Ok(n)
    }

    /// 读取整张表
    pub fn load(&self) -> Result<Vec<ResultRecord>> {
        read_table(&self.path)
    }
}

/// 写入一张完整的表（单项目结果文件或新建累计表）
pub fn write_table(path: &Path, role: Role, records: &[ResultRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ScanError::csv(path, e))?;
    writer.write_record(ResultRecord::header(role)).map_err(|e| ScanError::csv(path, e))?;
    for r in records {
        writer.write_record(r.to_row()).map_err(|e| ScanError::csv(path, e))?;
    }
    writer.flush().map_err(|e| ScanError::io(path, e))
}

/// 读取结果表；列按表头名定位，第二列视为 Yes/No 标志列
pub fn read_table(path: &Path) -> Result<Vec<ResultRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ScanError::csv(path, e))?;
    let headers = reader.headers().map_err(|e| ScanError::csv(path, e))?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let project_col = column("ProjectName").ok_or_else(|| ScanError::InvalidResultTable {
        path: path.to_path_buf(),
        message: "missing `ProjectName` column".to_string(),
    })?;
    let flag_col = headers.iter().position(|h| h.trim().starts_with("Is ML "));
    let (lib_col, where_col, kw_col, line_col) =
        (column("libraries"), column("where"), column("keywords"), column("line_number"));

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ScanError::csv(path, e))?;
        let get = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or_default().to_string();
        let project_name = get(Some(project_col));
        if project_name.is_empty() {
            continue;
        }
        out.push(ResultRecord {
            project_name,
            flag: !get(flag_col).trim().eq_ignore_ascii_case("no"),
            library: get(lib_col),
            file_path: get(where_col),
            keyword: get(kw_col),
            line_number: get(line_col).trim().parse().ok(),
        });
    }
    Ok(out)
}

/// 复制现有表为 `results_<role>_backup_<unix 秒>.csv`
fn backup_table(dir: &Path, role: Role, path: &Path) -> Result<PathBuf> {
    let backup = free_backup_path(dir, role, chrono::Utc::now().timestamp());
    std::fs::copy(path, &backup).map_err(|e| ScanError::io(&backup, e))?;
    info!(from = %path.display(), to = %backup.display(), "backed up result table");
    Ok(backup)
}

/// 同一秒内已有备份时依次追加 `_1`、`_2`…，不覆盖旧备份
fn free_backup_path(dir: &Path, role: Role, stamp: i64) -> PathBuf {
    let base = format!("results_{}_backup_{stamp}", role.as_str());
    let mut candidate = dir.join(format!("{base}.csv"));
    let mut n = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{base}_{n}.csv"));
        n += 1;
    }
    candidate
}

fn ensure_trailing_newline(file: &mut File) -> std::io::Result<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(project: &str, kw: &str, line: usize) -> ResultRecord {
        ResultRecord {
            project_name: project.to_string(),
            flag: true,
            library: "sklearn".to_string(),
            file_path: format!("{project}/train.py"),
            keyword: kw.to_string(),
            line_number: Some(line),
        }
    }

    #[test]
    fn new_table_is_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path(), Role::Producer).unwrap();
        let txt = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(txt, "ProjectName,Is ML producer,libraries,where,keywords,line_number\n");
        assert!(store.backup_path().is_none());
        assert_eq!(store.project_count(), 0);
    }

    #[test]
    fn flushed_rows_survive_reopen_and_are_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = ResultStore::open(dir.path(), Role::Consumer).unwrap();
            store.append(vec![record("o/a", ".predict(", 3), record("o/a", "torch.load(", 9)]);
            assert!(store.contains("o/a"));
            assert_eq!(store.flush().unwrap(), 2);
            assert_eq!(store.flush().unwrap(), 0);
        }

        let store = ResultStore::open(dir.path(), Role::Consumer).unwrap();
        assert!(store.contains("o/a"));
        assert!(!store.contains("o/b"));
        let backup = store.backup_path().unwrap();
        assert!(backup.file_name().unwrap().to_string_lossy().starts_with("results_consumer_backup_"));
        assert_eq!(read_table(backup).unwrap().len(), 2);

        let rows = store.load().unwrap();
        assert_eq!(rows[1].keyword, "torch.load(");
        assert_eq!(rows[1].line_number, Some(9));
    }

    #[test]
    fn marker_rows_read_back_as_no() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::open(dir.path(), Role::Producer).unwrap();
        store.append(vec![ResultRecord::processed_marker("o/empty")]);
        store.flush().unwrap();

        let rows = store.load().unwrap();
        assert_eq!(rows, vec![ResultRecord::processed_marker("o/empty")]);
    }

    #[test]
    fn append_repairs_missing_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Role::Producer.cumulative_file_name());
        std::fs::write(&path, "ProjectName,Is ML producer,libraries,where,keywords,line_number\no/a,Yes,sklearn,t.py,.fit(,1").unwrap();

        let mut store = ResultStore::open(dir.path(), Role::Producer).unwrap();
        store.append(vec![record("o/b", ".fit(", 2)]);
        store.flush().unwrap();

        let rows = read_table(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].project_name, "o/b");
    }

    #[test]
    fn back_to_back_opens_each_get_a_backup() {
        let dir = tempfile::tempdir().unwrap();
        ResultStore::open(dir.path(), Role::Producer).unwrap();
        let first = ResultStore::open(dir.path(), Role::Producer).unwrap();
        let second = ResultStore::open(dir.path(), Role::Producer).unwrap();

        let (a, b) = (first.backup_path().unwrap(), second.backup_path().unwrap());
        assert_ne!(a, b);
        assert!(a.is_file() && b.is_file());
    }

    #[test]
    fn backup_name_collision_gets_a_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let taken = dir.path().join("results_consumer_backup_1700000000.csv");
        std::fs::write(&taken, "x").unwrap();
        std::fs::write(dir.path().join("results_consumer_backup_1700000000_1.csv"), "x").unwrap();

        let next = free_backup_path(dir.path(), Role::Consumer, 1_700_000_000);
        assert_eq!(next, dir.path().join("results_consumer_backup_1700000000_2.csv"));
        assert_eq!(
            free_backup_path(dir.path(), Role::Consumer, 1_700_000_001),
            dir.path().join("results_consumer_backup_1700000001.csv")
        );
    }

    #[test]
    fn inspect_reads_baseline_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let role_dir = dir.path().join("Producers");
        let store = ResultStore::inspect(&role_dir, Role::Producer).unwrap();
        assert_eq!(store.project_count(), 0);
        assert!(!role_dir.exists());
    }

    #[test]
    fn table_without_project_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Role::Producer.cumulative_file_name());
        std::fs::write(&path, "name,flag\n").unwrap();
        assert!(matches!(
            ResultStore::open(dir.path(), Role::Producer),
            Err(ScanError::InvalidResultTable { .. })
        ));
    }
}
