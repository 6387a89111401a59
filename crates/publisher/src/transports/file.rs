//! FileTransport - appends every message to one file per topic

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{Channel, ContractError, Message, Transport};
use tracing::{debug, instrument};

/// On-disk encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// One JSON document per line (`.jsonl`)
    #[default]
    Json,
    /// u32 little-endian length prefix + bincode body (`.bin`)
    Bincode,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Json => "jsonl",
            FileFormat::Bincode => "bin",
        }
    }
}

/// Configuration for FileTransport
#[derive(Debug, Clone)]
pub struct FileTransportConfig {
    /// Base output directory
    pub base_path: PathBuf,
    pub format: FileFormat,
}

impl FileTransportConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        let format = match params.get("format").map(String::as_str) {
            Some("bincode") => FileFormat::Bincode,
            Some("json") | None => FileFormat::Json,
            Some(other) => return Err(format!("unknown format '{other}'")),
        };

        Ok(Self { base_path, format })
    }
}

/// Transport writing messages to disk
pub struct FileTransport {
    config: FileTransportConfig,
}

impl FileTransport {
    /// Create a new FileTransport, creating the base directory
    pub fn new(config: FileTransportConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;
        Ok(Self { config })
    }

    /// Create from params map (for factory)
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        let config = FileTransportConfig::from_params(params)
            .map_err(|e| ContractError::config_validation("transport.params.format", e))?;
        Ok(Self::new(config)?)
    }

    /// File a topic is written to
    pub fn topic_path(&self, topic: &str) -> PathBuf {
        let file_name = format!("{}.{}", topic.replace('/', "_"), self.config.format.extension());
        self.config.base_path.join(file_name)
    }
}

impl Transport for FileTransport {
    fn name(&self) -> &str {
        "file"
    }

    #[instrument(name = "file_transport_advertise", skip(self))]
    fn advertise(&self, topic: &str, queue_size: usize) -> Result<Arc<dyn Channel>, ContractError> {
        let path = self.topic_path(topic);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ContractError::advertise(self.name(), topic, e.to_string()))?;

        debug!(topic, path = %path.display(), "file channel advertised");
        Ok(Arc::new(FileChannel {
            topic: topic.to_string(),
            format: self.config.format,
            file: Mutex::new(file),
        }))
    }
}

struct FileChannel {
    topic: String,
    format: FileFormat,
    file: Mutex<File>,
}

impl FileChannel {
    fn encode(&self, message: &Message) -> Result<Vec<u8>, String> {
        match self.format {
            FileFormat::Json => {
                let mut line = serde_json::to_vec(message).map_err(|e| format!("json error: {e}"))?;
                line.push(b'\n');
                Ok(line)
            }
            FileFormat::Bincode => {
                let body = bincode::serialize(message).map_err(|e| format!("bincode error: {e}"))?;
                let len = u32::try_from(body.len()).map_err(|_| "message too large".to_string())?;
                let mut record = Vec::with_capacity(4 + body.len());
                record.extend_from_slice(&len.to_le_bytes());
                record.extend_from_slice(&body);
                Ok(record)
            }
        }
    }
}

impl Channel for FileChannel {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&self, message: Message) -> Result<(), ContractError> {
        let record = self
            .encode(&message)
            .map_err(|e| ContractError::publish(&self.topic, e))?;

        // One write per record keeps records whole when channels share a file
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(&record)
            .map_err(|e| ContractError::publish(&self.topic, e.to_string()))
    }
}

/// Read back every message a FileTransport wrote to `path`.
pub fn read_messages(path: &Path, format: FileFormat) -> Result<Vec<Message>, ContractError> {
    let file = File::open(path)?;
    match format {
        FileFormat::Json => BufReader::new(file)
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.is_empty()))
            .map(|line| {
                let line = line?;
                serde_json::from_str(&line).map_err(|e| {
                    ContractError::payload_decode(path.display().to_string(), e.to_string())
                })
            })
            .collect(),
        FileFormat::Bincode => {
            let mut bytes = Vec::new();
            BufReader::new(file).read_to_end(&mut bytes)?;

            let mut messages = Vec::new();
            let mut rest = bytes.as_slice();
            while !rest.is_empty() {
                let truncated =
                    || ContractError::payload_decode(path.display().to_string(), "truncated record");
                let (len, body) = rest.split_at_checked(4).ok_or_else(truncated)?;
                let len = u32::from_le_bytes([len[0], len[1], len[2], len[3]]) as usize;
                let (record, tail) = body.split_at_checked(len).ok_or_else(truncated)?;
                messages.push(bincode::deserialize(record).map_err(|e| {
                    ContractError::payload_decode(path.display().to_string(), e.to_string())
                })?);
                rest = tail;
            }
            Ok(messages)
        }
    }
}
