/// 程序配置
///
/// 所有配置在进程启动时从环境变量读取一次，之后不再变化。
#[derive(Clone, Debug)]
pub struct Config {
    /// 数据根目录（data/<mode>/<key>/...）
    pub data_dir: String,
    /// 周期运行日志目录
    pub logs_dir: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 网络出口代理，空字符串表示直连
    pub proxy_url: String,
    // --- 编译沙箱配置 ---
    /// 全文翻译容器名
    pub sandbox_container: String,
    /// 宿主机上驱动程序二进制的路径（docker cp 进容器）
    pub driver_bin: String,
    /// 全文翻译外层超时（秒）
    pub full_timeout_secs: u64,
    /// 提交 API 监听地址
    pub serve_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            logs_dir: "logs".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4.1-mini".to_string(),
            proxy_url: "http://127.0.0.1:7890".to_string(),
            sandbox_container: "gpt-academic-latex".to_string(),
            driver_bin: "/usr/local/bin/full-translate-driver".to_string(),
            full_timeout_secs: 3600,
            serve_addr: "0.0.0.0:8085".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or(default.data_dir),
            logs_dir: std::env::var("LOGS_DIR").unwrap_or(default.logs_dir),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            proxy_url: std::env::var("PROXY_URL").unwrap_or(default.proxy_url),
            sandbox_container: std::env::var("SANDBOX_CONTAINER").unwrap_or(default.sandbox_container),
            driver_bin: std::env::var("DRIVER_BIN").unwrap_or(default.driver_bin),
            full_timeout_secs: std::env::var("FULL_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.full_timeout_secs),
            serve_addr: std::env::var("SERVE_ADDR").unwrap_or(default.serve_addr),
        }
    }
}
