//! 源文件读取（编码回退链）
//!
//! 整个文件一次读入内存后再按行扫描；峰值内存由最大的单个文件决定。
//! 读取或解码失败只记录日志，调用方拿到 `None` 后跳过该文件。
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::warn;

/// 解码方式；按 `FALLBACK_CHAIN` 顺序尝试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// ISO-8859-1：每个字节直接映射为 U+0000..U+00FF
    Latin1,
}

pub(crate) const FALLBACK_CHAIN: [TextEncoding; 2] = [TextEncoding::Utf8, TextEncoding::Latin1];

impl TextEncoding {
    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// 已解码的源文件
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    pub encoding: TextEncoding,
}

impl SourceFile {
    /// 读取并解码文件；无法打开或全部编码均失败时返回 `None`（非致命）
    pub fn read(path: &Path) -> Option<Self> {
        let bytes = match read_bytes(path) {
            Ok(b) => b,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "error reading file");
                return None;
            }
        };
        match Self::decode(path, &bytes) {
            Some(file) => Some(file),
            None => {
                warn!(path = %path.display(), "file could not be decoded with any supported encoding");
                None
            }
        }
    }

    /// 依次尝试回退链中的编码
    pub fn decode(path: &Path, bytes: &[u8]) -> Option<Self> {
        FALLBACK_CHAIN.iter().find_map(|&enc| {
            enc.decode(bytes).map(|text| Self { path: path.to_path_buf(), text, encoding: enc })
        })
    }

    /// 直接由内存文本构造（测试与上游转换器使用）
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self { path: path.into(), text: text.into(), encoding: TextEncoding::Utf8 }
    }

    /// 按行迭代（不含行结束符）
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }
}

fn read_bytes(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}
