use anyhow::Context;
use pos_server::{Config, Server, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境变量 (.env 可选)
    dotenv::dotenv().ok();

    // 2. 加载配置
    let config = Config::from_env().context("Invalid configuration")?;
    config
        .ensure_work_dir_structure()
        .context("Failed to prepare work directory")?;

    // 3. 日志 (guard 必须活到进程结束)
    let _log_guard = init_logger_with_file(
        Some(&config.log_level),
        config.log_json,
        config.log_dir.as_deref(),
    );

    print_banner();
    tracing::info!(environment = %config.environment, "POS server starting...");

    // 4. 启动 HTTP 服务器
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}
