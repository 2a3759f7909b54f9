// 行単位の入力を供給する Producer

use crate::core::ObjectProducer;
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// `BufRead` から1行ずつ読み出す Producer
///
/// 行末の `\n` / `\r\n` は取り除く。close() で読み込み元を解放する。
pub struct LineProducer<R> {
    reader: Option<R>,
    lines_read: usize,
    bytes_read: usize,
}

impl<R> LineProducer<R>
where
    R: BufRead + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            lines_read: 0,
            bytes_read: 0,
        }
    }

    /// 次の1行（EOF または解放済みなら None）
    pub fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .with_context(|| format!("failed to read line {}", self.lines_read + 1))?;
        if read == 0 {
            return Ok(None);
        }

        self.bytes_read += read;
        self.lines_read += 1;

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// 改行を含めた読み込みバイト数
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    pub fn is_released(&self) -> bool {
        self.reader.is_none()
    }
}

impl LineProducer<BufReader<File>> {
    /// ファイルを開いて Producer を作成
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R> ObjectProducer for LineProducer<R>
where
    R: BufRead + Send,
{
    fn close(&mut self) -> anyhow::Result<()> {
        if self.reader.take().is_some() {
            tracing::debug!(lines = self.lines_read, bytes = self.bytes_read, "line source released");
        }
        Ok(())
    }
}
