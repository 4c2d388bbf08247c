use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件目录
    pub models_dir: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,

    /// 百科查询配置
    pub lookup_config: LookupConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// 语言代码，例如 "pl"
    pub language: String,

    /// MediaWiki API 地址
    pub endpoint: String,

    pub user_agent: String,

    pub timeout: Duration,
}

impl LookupConfig {
    pub fn new(language: String, endpoint: Option<String>) -> Result<Self> {
        let language = language.trim().to_lowercase();
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            bail!("Invalid lookup language code: '{}'", language);
        }

        let endpoint = endpoint
            .unwrap_or_else(|| format!("https://{}.wikipedia.org/w/api.php", language));

        Ok(Self {
            language,
            endpoint,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(10),
        })
    }
}

impl Config {
    pub fn new(
        bind_addr: String,
        models_dir: String,
        workers: Option<usize>,
        dev_mode: bool,
        lookup_config: LookupConfig,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);
        if workers == 0 {
            bail!("Worker count must be at least 1");
        }

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 }, // 开发模式更长超时
            max_request_size: 20 * 1024 * 1024, // 20MB
        };

        Ok(Self {
            bind_addr,
            models_dir: PathBuf::from(models_dir),
            workers,
            dev_mode,
            onnx_config,
            server_config,
            lookup_config,
        })
    }

    /// ResNet 模型路径 (224x224)
    pub fn resnet_model_path(&self) -> PathBuf {
        self.models_dir.join("resnet/resnet_ft.onnx")
    }

    /// Inception 模型路径 (299x299)
    pub fn inception_model_path(&self) -> PathBuf {
        self.models_dir.join("inception/inception_ft.onnx")
    }
}
