//! 公共类型（对外暴露）
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// 分类类型：模型生产者 / 模型消费者
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Producer,
    Consumer,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Producer, Role::Consumer];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Producer => "producer",
            Role::Consumer => "consumer",
        }
    }

    /// 结果表中的标志列名，例如 `Is ML producer`
    pub fn flag_column(self) -> String {
        format!("Is ML {}", self.as_str())
    }

    /// 输出目录下该类型的子目录名
    pub fn dir_name(self) -> &'static str {
        match self {
            Role::Producer => "Producers",
            Role::Consumer => "Consumers",
        }
    }

    /// 累计结果表文件名
    pub fn cumulative_file_name(self) -> String {
        format!("results_{}.csv", self.as_str())
    }

    /// 单项目结果表文件名（由项目标识确定性生成）
    pub fn project_file_name(self, project: &ProjectId) -> String {
        format!("{}_ml_{}.csv", project.file_stem(), self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "producer" => Ok(Role::Producer),
            "consumer" => Ok(Role::Consumer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// 项目标识：语料根目录下的 `organization/repository`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId {
    pub organization: String,
    pub repository: String,
}

impl ProjectId {
    pub fn new(organization: impl Into<String>, repository: impl Into<String>) -> Self {
        Self { organization: organization.into(), repository: repository.into() }
    }

    /// 结果表中的 ProjectName 复合键
    pub fn name(&self) -> String {
        format!("{}/{}", self.organization, self.repository)
    }

    /// `{org}_{repo}`；organization 中的 `%` 与 `_` 做百分号转义，
    /// 第一个裸 `_` 即为分隔符，不同项目不会映射到同一文件
    pub(crate) fn file_stem(&self) -> String {
        let org = self.organization.replace('%', "%25").replace('_', "%5F");
        format!("{}_{}", org, self.repository)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.repository)
    }
}

/// 某一关键字在某一行上的一次命中
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub library: String,
    pub keyword: String,
    pub file_path: PathBuf,
    /// 行号从 1 开始
    pub line_number: usize,
    /// 去除首尾空白后的命中行
    pub line_text: String,
}

/// 单个项目的分类结果及其证据
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectClassification {
    pub project_name: String,
    pub is_producer: bool,
    pub is_consumer: bool,
    pub producer_detections: Vec<Detection>,
    pub consumer_detections: Vec<Detection>,
}

impl ProjectClassification {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self { project_name: project_name.into(), ..Self::default() }
    }

    pub fn detections(&self, role: Role) -> &[Detection] {
        match role {
            Role::Producer => &self.producer_detections,
            Role::Consumer => &self.consumer_detections,
        }
    }

    pub(crate) fn push(&mut self, role: Role, mut found: Vec<Detection>) {
        match role {
            Role::Producer => {
                self.producer_detections.append(&mut found);
                self.is_producer = !self.producer_detections.is_empty();
            }
            Role::Consumer => {
                self.consumer_detections.append(&mut found);
                self.is_consumer = !self.consumer_detections.is_empty();
            }
        }
    }
}

/// 结果表中的一行：{ProjectName, Is ML <role>, libraries, where, keywords, line_number}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub project_name: String,
    pub flag: bool,
    pub library: String,
    pub file_path: String,
    pub keyword: String,
    pub line_number: Option<usize>,
}

impl ResultRecord {
    pub fn from_detection(project_name: &str, d: &Detection) -> Self {
        Self {
            project_name: project_name.to_string(),
            flag: true,
            library: d.library.clone(),
            file_path: d.file_path.display().to_string(),
            keyword: d.keyword.clone(),
            line_number: Some(d.line_number),
        }
    }

    /// 零命中项目的“已处理”标记行（仅在 mark_empty_projects 开启时写入）
    pub fn processed_marker(project_name: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            flag: false,
            library: String::new(),
            file_path: String::new(),
            keyword: String::new(),
            line_number: None,
        }
    }

    pub fn header(role: Role) -> [String; 6] {
        [
            "ProjectName".to_string(),
            role.flag_column(),
            "libraries".to_string(),
            "where".to_string(),
            "keywords".to_string(),
            "line_number".to_string(),
        ]
    }

    pub fn to_row(&self) -> [String; 6] {
        [
            self.project_name.clone(),
            if self.flag { "Yes" } else { "No" }.to_string(),
            self.library.clone(),
            self.file_path.clone(),
            self.keyword.clone(),
            self.line_number.map(|n| n.to_string()).unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_file_names_are_deterministic() {
        let p = ProjectId::new("orgA", "repoA");
        assert_eq!(p.name(), "orgA/repoA");
        assert_eq!(Role::Producer.project_file_name(&p), "orgA_repoA_ml_producer.csv");
        assert_eq!(Role::Consumer.cumulative_file_name(), "results_consumer.csv");
        assert_eq!(Role::Consumer.flag_column(), "Is ML consumer");
    }

    #[test]
    fn underscored_names_do_not_share_a_project_file() {
        let a = ProjectId::new("a", "b_c");
        let b = ProjectId::new("a_b", "c");
        assert_eq!(Role::Producer.project_file_name(&a), "a_b_c_ml_producer.csv");
        assert_eq!(Role::Producer.project_file_name(&b), "a%5Fb_c_ml_producer.csv");
        assert_ne!(
            ProjectId::new("a%5Fb", "c").file_stem(),
            b.file_stem()
        );
    }

    #[test]
    fn marker_row_has_no_evidence() {
        let row = ResultRecord::processed_marker("o/r").to_row();
        assert_eq!(row[0], "o/r");
        assert_eq!(row[1], "No");
        assert!(row[2..].iter().all(|c| c.is_empty()));
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Producer".parse::<Role>().unwrap(), Role::Producer);
        assert!("trainer".parse::<Role>().is_err());
    }
}
