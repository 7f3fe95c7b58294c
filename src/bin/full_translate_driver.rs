//! 容器内全文翻译驱动入口
//!
//! 用法: full-translate-driver <arxiv_id> [--no-cache]
//! 输出: RESULT:SUCCESS:<pdf_path>  或  RESULT:ERROR:<msg>

use paper_trans::driver::{self, DriverConfig, MAX_RETRIES};

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let no_cache = args.iter().any(|a| a == "--no-cache");
    let arxiv_id = args.iter().find(|a| !a.starts_with("--"));

    let Some(arxiv_id) = arxiv_id else {
        println!("RESULT:ERROR:请提供 arxiv_id");
        std::process::exit(1);
    };

    let config = DriverConfig::from_env(arxiv_id, no_cache);
    match driver::run(&config).await {
        Some(pdf) => {
            println!("RESULT:SUCCESS:{}", pdf.display());
        }
        None => {
            println!("RESULT:ERROR:所有 {} 次尝试均未生成 PDF", MAX_RETRIES + 1);
            std::process::exit(1);
        }
    }
}
