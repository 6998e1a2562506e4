use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feats_backend::{
    Config,
    database::Database,
    handlers::AppState,
    intake::{ImageIntake, IntakeConfig},
    repositories::AnalysisRepository,
    routes::create_api_routes,
    services::{AnalysisOrchestrator, GroqClient},
    storage::MinioImageStore,
};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feats_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("FEATS分析服务启动中...");

    // 加载配置，文件不存在或非法时写出默认配置并以其启动
    let config = match Config::from_file(CONFIG_PATH) {
        Ok(config) => {
            info!("已加载配置文件: {}", CONFIG_PATH);
            config
        }
        Err(e) => {
            warn!("加载配置文件失败（{}），使用默认配置: {}", CONFIG_PATH, e);
            let config = Config::default();
            if let Err(e) = config.save_to_file(CONFIG_PATH) {
                warn!("写出默认配置失败: {}", e);
            }
            config
        }
    };

    // 数据库：连不上不阻止启动，历史查询返回503，管线跳过持久化
    let database = match Database::new(&config.database).await {
        Ok(db) => Some(db),
        Err(e) => {
            warn!("数据库连接失败，持久化功能禁用: {}", e);
            None
        }
    };
    let repository = database.clone().map(AnalysisRepository::new);

    // 图像托管：初始化失败不阻止启动，管线走降级路径
    let storage = match MinioImageStore::new(config.minio.clone()).await {
        Ok(store) => {
            if let Err(e) = store.ensure_bucket(&config.minio.bucket).await {
                warn!("初始化bucket失败，托管请求将降级: {}", e);
            }
            Some(store)
        }
        Err(e) => {
            warn!("图像托管服务初始化失败，托管功能禁用: {}", e);
            None
        }
    };

    // 推理：未配置API密钥即禁用
    let inference = if config.inference.api_key.is_empty() {
        warn!("未配置推理API密钥，推理功能禁用");
        None
    } else {
        match GroqClient::new(config.inference.clone()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!("推理客户端初始化失败，推理功能禁用: {}", e);
                None
            }
        }
    };

    let orchestrator = AnalysisOrchestrator::new(
        ImageIntake::new(IntakeConfig::from(&config.file)),
        storage.clone().map(Arc::new),
        inference.clone(),
        repository.clone().map(Arc::new),
        config.pipeline.clone(),
    );

    let state = AppState {
        config: config.clone(),
        orchestrator,
        database: database.clone(),
        storage,
        inference,
        repository,
    };

    let cors = build_cors_layer(&config.server.cors_origin)?;

    // multipart封包比图像本身略大，放宽一段余量
    let body_limit = config.file.max_size as usize + 1024 * 1024;

    let app = create_api_routes(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.server_addr();
    info!("服务监听于 http://{}", addr);
    info!("API文档: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 退出前释放数据库连接池
    if let Some(db) = database {
        db.close().await;
    }
    info!("服务已关闭");

    Ok(())
}

/// 等待退出信号（Ctrl+C）
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("监听退出信号失败: {}", e);
        return;
    }
    info!("收到退出信号，开始关闭服务");
}

/// 按配置构造CORS层，"*" 表示允许任意来源
fn build_cors_layer(cors_origin: &str) -> anyhow::Result<CorsLayer> {
    let cors = if cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origin = cors_origin
            .parse::<HeaderValue>()
            .map_err(|e| anyhow::anyhow!("CORS来源配置非法: {}", e))?;
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Ok(cors)
}
