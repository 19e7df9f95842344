use std::path::Path;

use anyhow::Result;
use smart_worksheet::app::App;
use smart_worksheet::config::Config;
use smart_worksheet::models::{load_request_file, GenerationRequestParams};
use smart_worksheet::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 加载请求（未指定文件时使用表单默认值）
    let params = match std::env::args().nth(1) {
        Some(path) => load_request_file(Path::new(&path)).await?,
        None => GenerationRequestParams::default(),
    };

    // 初始化并运行应用
    let app = App::initialize(config)?;
    app.run(params).await?;

    Ok(())
}
