//! 命令行应用
//!
//! 扮演展示层：订阅状态打印进度横幅，插图全部落定后写出可打印的 HTML

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tokio::fs;
use tracing::{error, info};

use crate::config::Config;
use crate::error::AppError;
use crate::models::GenerationRequestParams;
use crate::orchestrator::WorksheetOrchestrator;
use crate::services::{render_worksheet_html, GeminiBackend, GenerationBackend};
use crate::utils::logging::{log_progress, log_startup};
use crate::workflow::WorksheetSnapshot;

/// 应用主结构
pub struct App<B = GeminiBackend> {
    config: Config,
    orchestrator: WorksheetOrchestrator<B>,
}

impl App<GeminiBackend> {
    /// 使用 Gemini 后端初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        let backend = GeminiBackend::new(&config);
        Ok(Self::with_backend(config, backend))
    }
}

impl<B: GenerationBackend> App<B> {
    /// 使用指定后端初始化应用
    pub fn with_backend(config: Config, backend: B) -> Self {
        log_startup(&config);
        let orchestrator = WorksheetOrchestrator::new(backend, &config);
        Self {
            config,
            orchestrator,
        }
    }

    pub fn orchestrator(&self) -> &WorksheetOrchestrator<B> {
        &self.orchestrator
    }

    /// 生成一份学习单并写出 HTML，返回文件路径
    pub async fn run(&self, params: GenerationRequestParams) -> Result<PathBuf> {
        let mut rx = self.orchestrator.subscribe();
        let progress = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                log_progress(&snapshot);
            }
        });

        let run = match self.orchestrator.generate(params).await {
            Ok(run) => run,
            Err(e) => {
                progress.abort();
                error!("❌ 生成学习单时出错，请检查 API Key 后重试");
                return Err(e.into());
            }
        };

        run.wait().await;
        progress.abort();

        let snapshot = self.orchestrator.state().snapshot();
        let path = self.write_html(&snapshot).await?;
        info!("\n学习单已保存至: {}", path.display());

        Ok(path)
    }

    /// 写出 HTML 文件
    async fn write_html(&self, snapshot: &WorksheetSnapshot) -> Result<PathBuf> {
        let output_dir = Path::new(&self.config.output_dir);
        fs::create_dir_all(output_dir)
            .await
            .map_err(|e| AppError::file(output_dir.display().to_string(), e))?;

        let title = snapshot
            .document
            .as_ref()
            .map(|d| d.title.as_str())
            .unwrap_or("worksheet");
        let file_name = format!(
            "{}-{}.html",
            slugify(title),
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        );
        let path = output_dir.join(file_name);

        fs::write(&path, render_worksheet_html(snapshot))
            .await
            .with_context(|| format!("无法写入文件: {}", path.display()))?;

        Ok(path)
    }
}

/// 把标题转换成文件名
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let slug = match Regex::new(r"[^a-z0-9]+") {
        Ok(re) => re.replace_all(&lower, "-").trim_matches('-').to_string(),
        Err(_) => String::new(),
    };

    if slug.is_empty() {
        "worksheet".to_string()
    } else {
        slug
    }
}
