use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    catalog,
    config::PipelineConfig,
    error::{AppError, AppResult},
    intake::{IdentityPolicy, ImageIntake, RawUpload, ValidatedImage},
    models::{AnalysisResult, ImageRecord, Scale},
    repositories::AnalysisStore,
    services::inference_client::{ImageSource, InferenceGateway, InferenceOutcome},
    storage::ImageHost,
};

/// 托管失败且无法继续推理时的用户可见说明
const UPLOAD_FALLBACK_MESSAGE: &str =
    "Unable to upload image to the hosting service. Using default analysis.";

/// 推理失败时的用户可见说明
const INFERENCE_FALLBACK_MESSAGE: &str = "Unable to analyze the image. Using default analysis.";

/// 托管失败但推理仍基于原始字节完成时的说明
const HOSTING_DEGRADED_MESSAGE: &str =
    "Image hosting is temporarily unavailable; analysis was performed on the raw upload.";

/// 管线终态
///
/// `Rejected` 只能由验证阶段产生（以错误返回的形式体现），
/// 两个降级终态分别对应托管失败与推理失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Complete,
    DegradedUploading,
    DegradedInferring,
}

/// 一次管线运行的装配结果
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// 管线终态
    pub state: PipelineState,
    /// 已落库的图像记录ID，持久化未执行或失败时为空
    pub image_id: Option<Uuid>,
    /// 托管后的图像地址，托管失败时为空
    pub image_url: Option<String>,
    /// 量表结果，降级时为目录默认值
    pub scales: Vec<Scale>,
    /// 降级说明，仅在降级路径上非空
    pub message: Option<String>,
    pub model_version: Option<String>,
    pub processing_time: Option<f64>,
    /// 持久化失败的次要告警，不影响结果本身
    pub persist_warning: Option<String>,
}

impl AnalysisOutcome {
    /// 是否为降级结果
    pub fn is_degraded(&self) -> bool {
        !matches!(self.state, PipelineState::Complete)
    }
}

/// 推理阶段的内部结果
enum InferencePhase {
    Real(InferenceOutcome),
    DegradedUploading,
    DegradedInferring,
}

/// 分析编排器
///
/// 按 验证 → 托管 → 推理 → 持久化 的顺序驱动管线。除验证外的
/// 任何依赖故障都降级吸收而不上抛：调用方（几乎）只会因为
/// 输入不合法而看到硬错误。三个网关均通过参数注入，便于测试
/// 时替换为假实现；未配置的网关以 `None` 表示，对应请求走
/// 匹配的降级路径。
pub struct AnalysisOrchestrator<H, I, S> {
    intake: ImageIntake,
    host: Option<Arc<H>>,
    inference: Option<Arc<I>>,
    store: Option<Arc<S>>,
    timeouts: PipelineConfig,
}

impl<H, I, S> Clone for AnalysisOrchestrator<H, I, S> {
    fn clone(&self) -> Self {
        Self {
            intake: self.intake.clone(),
            host: self.host.clone(),
            inference: self.inference.clone(),
            store: self.store.clone(),
            timeouts: self.timeouts.clone(),
        }
    }
}

impl<H, I, S> AnalysisOrchestrator<H, I, S>
where
    H: ImageHost + Send + Sync,
    I: InferenceGateway + Send + Sync,
    S: AnalysisStore + Send + Sync,
{
    pub fn new(
        intake: ImageIntake,
        host: Option<Arc<H>>,
        inference: Option<Arc<I>>,
        store: Option<Arc<S>>,
        timeouts: PipelineConfig,
    ) -> Self {
        Self {
            intake,
            host,
            inference,
            store,
            timeouts,
        }
    }

    /// 执行完整的分析管线
    ///
    /// 验证失败直接以错误返回（Rejected终态），此时不会触碰任何
    /// 网关；验证通过后的所有故障都转化为降级的 `AnalysisOutcome`。
    pub async fn run(
        &self,
        raw: RawUpload,
        policy: IdentityPolicy,
    ) -> AppResult<AnalysisOutcome> {
        // Validating
        let image = self.intake.validate(raw, policy)?;

        // Uploading：最多尝试一次，失败进入降级路径
        let image_url = self.upload_image(&image).await;

        // 图像记录在推理开始前创建并尽量落库
        let record = ImageRecord::new(
            image
                .user_id
                .clone()
                .unwrap_or_else(|| "anonymous".to_string()),
            image_url.clone(),
        );
        let mut persist_warning = None;
        let image_id = self.persist_image(&record, &mut persist_warning).await;

        // Inferring
        let phase = self.run_inference(&image, image_url.as_deref()).await;

        let (state, scales, message, model_version, processing_time) = match phase {
            InferencePhase::Real(outcome) => {
                let message = image_url
                    .is_none()
                    .then(|| HOSTING_DEGRADED_MESSAGE.to_string());
                (
                    PipelineState::Complete,
                    outcome.scales,
                    message,
                    Some(outcome.model_version),
                    Some(outcome.processing_time),
                )
            }
            InferencePhase::DegradedUploading => (
                PipelineState::DegradedUploading,
                catalog::default_scales(),
                Some(UPLOAD_FALLBACK_MESSAGE.to_string()),
                None,
                None,
            ),
            InferencePhase::DegradedInferring => (
                PipelineState::DegradedInferring,
                catalog::default_scales(),
                Some(INFERENCE_FALLBACK_MESSAGE.to_string()),
                None,
                None,
            ),
        };

        // Persisting：降级结果也落库（带降级标记），失败只记告警，
        // 不使已计算出的结果失效
        let analysis = AnalysisResult::new(
            record.id,
            scales.clone(),
            !matches!(state, PipelineState::Complete),
            model_version.clone(),
            processing_time,
        );
        self.persist_analysis(&analysis, &mut persist_warning).await;

        info!(
            image_id = %record.id,
            state = ?state,
            degraded = !matches!(state, PipelineState::Complete),
            "分析管线结束"
        );

        Ok(AnalysisOutcome {
            state,
            image_id,
            image_url,
            scales,
            message,
            model_version,
            processing_time,
            persist_warning,
        })
    }

    /// 托管图像字节，返回可访问地址
    async fn upload_image(&self, image: &ValidatedImage) -> Option<String> {
        let Some(host) = &self.host else {
            warn!("图像托管服务未配置，进入降级路径");
            return None;
        };

        let key = format!(
            "artworks/{}/{}",
            chrono::Utc::now().format("%Y/%m/%d"),
            image.sha256
        );

        let result = with_timeout(
            self.timeouts.upload_timeout_secs,
            "图像托管",
            host.store_image(&key, &image.bytes, &image.content_type),
        )
        .await;

        match result {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("图像托管失败，进入降级路径: {}", e);
                None
            }
        }
    }

    /// 推理阶段
    async fn run_inference(
        &self,
        image: &ValidatedImage,
        image_url: Option<&str>,
    ) -> InferencePhase {
        let Some(gateway) = &self.inference else {
            warn!("推理服务未配置，使用目录默认分析");
            return InferencePhase::DegradedInferring;
        };

        let source = match image_url {
            Some(url) => ImageSource::Url(url.to_string()),
            None => {
                if !gateway.supports_raw_bytes() {
                    // 托管失败且网关不接受原始字节，直接回落到目录默认值
                    return InferencePhase::DegradedUploading;
                }
                ImageSource::Bytes {
                    data: image.bytes.clone(),
                    content_type: image.content_type.clone(),
                }
            }
        };

        let result = with_timeout(
            self.timeouts.inference_timeout_secs,
            "推理",
            gateway.infer(&source),
        )
        .await;

        match result {
            Ok(outcome) => InferencePhase::Real(outcome),
            Err(e) => {
                warn!("推理失败，使用目录默认分析: {}", e);
                InferencePhase::DegradedInferring
            }
        }
    }

    /// 落库图像记录，失败记为次要告警
    async fn persist_image(
        &self,
        record: &ImageRecord,
        persist_warning: &mut Option<String>,
    ) -> Option<Uuid> {
        let store = self.store.as_ref()?;

        let result = with_timeout(
            self.timeouts.persist_timeout_secs,
            "图像记录写入",
            store.save_image(record),
        )
        .await;

        match result {
            Ok(()) => Some(record.id),
            Err(e) => {
                warn!("图像记录写入失败: {}", e);
                *persist_warning = Some(format!("图像记录写入失败: {}", e));
                None
            }
        }
    }

    /// 落库分析结果，失败记为次要告警
    async fn persist_analysis(
        &self,
        analysis: &AnalysisResult,
        persist_warning: &mut Option<String>,
    ) {
        let Some(store) = &self.store else {
            return;
        };

        let result = with_timeout(
            self.timeouts.persist_timeout_secs,
            "分析结果写入",
            store.save_analysis(analysis),
        )
        .await;

        if let Err(e) = result {
            warn!("分析结果写入失败: {}", e);
            *persist_warning = Some(format!("分析结果写入失败: {}", e));
        }
    }
}

/// 为网关调用套上有界超时
async fn with_timeout<T>(
    secs: u64,
    what: &str,
    fut: impl std::future::Future<Output = AppResult<T>> + Send,
) -> AppResult<T> {
    match tokio::time::timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::service_unavailable(format!(
            "{}超时（{}秒）",
            what, secs
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::IntakeConfig;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // 最小PNG文件头，足够通过类型检查
    const PNG_HEADER: [u8; 16] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    fn png_upload(identity: Option<&str>) -> RawUpload {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.resize(1024, 0);
        RawUpload {
            bytes,
            declared_type: Some("image/png".to_string()),
            identity: identity.map(|s| s.to_string()),
        }
    }

    #[derive(Default)]
    struct FakeHost {
        calls: AtomicUsize,
        fail: bool,
        hang: bool,
    }

    #[async_trait::async_trait]
    impl ImageHost for FakeHost {
        async fn store_image(
            &self,
            key: &str,
            _data: &[u8],
            _content_type: &str,
        ) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.fail {
                return Err(AppError::upload("托管服务不可达"));
            }
            Ok(format!("http://fake-host/{}", key))
        }

        async fn health_check(&self) -> AppResult<bool> {
            Ok(!self.fail)
        }
    }

    #[derive(Default)]
    struct FakeGateway {
        calls: AtomicUsize,
        fail: bool,
        raw_bytes: bool,
    }

    #[async_trait::async_trait]
    impl InferenceGateway for FakeGateway {
        fn supports_raw_bytes(&self) -> bool {
            self.raw_bytes
        }

        async fn infer(&self, _source: &ImageSource) -> AppResult<InferenceOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::inference_unavailable("推理服务不可达"));
            }
            let scales = catalog::default_scales()
                .into_iter()
                .map(|mut s| {
                    s.rating = 4;
                    s.explanation = format!("Model explanation for {}", s.title);
                    s
                })
                .collect();
            Ok(InferenceOutcome {
                scales,
                model_version: "fake-model-v1".to_string(),
                processing_time: 1.5,
            })
        }
    }

    /// 以序列化往返模拟JSONB存储边界的假仓库
    #[derive(Default)]
    struct FakeStore {
        calls: AtomicUsize,
        fail: bool,
        images: Mutex<Vec<serde_json::Value>>,
        analyses: Mutex<Vec<serde_json::Value>>,
    }

    #[async_trait::async_trait]
    impl AnalysisStore for FakeStore {
        async fn save_image(&self, record: &ImageRecord) -> AppResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::storage("数据库不可达"));
            }
            self.images
                .lock()
                .unwrap()
                .push(serde_json::to_value(record)?);
            Ok(())
        }

        async fn save_analysis(&self, result: &AnalysisResult) -> AppResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::storage("数据库不可达"));
            }
            self.analyses
                .lock()
                .unwrap()
                .push(serde_json::to_value(result)?);
            Ok(())
        }

        async fn get_image(&self, id: Uuid) -> AppResult<Option<ImageRecord>> {
            let images = self.images.lock().unwrap();
            for value in images.iter() {
                let record: ImageRecord = serde_json::from_value(value.clone())?;
                if record.id == id {
                    return Ok(Some(record));
                }
            }
            Ok(None)
        }

        async fn get_analysis(&self, image_id: Uuid) -> AppResult<Option<AnalysisResult>> {
            let analyses = self.analyses.lock().unwrap();
            let mut latest: Option<AnalysisResult> = None;
            for value in analyses.iter() {
                let result: AnalysisResult = serde_json::from_value(value.clone())?;
                if result.image_id == image_id
                    && latest
                        .as_ref()
                        .is_none_or(|l| result.created_at > l.created_at)
                {
                    latest = Some(result);
                }
            }
            Ok(latest)
        }

        async fn get_average_ratings(&self) -> AppResult<Vec<crate::models::AverageRating>> {
            Ok(vec![])
        }
    }

    type TestOrchestrator = AnalysisOrchestrator<FakeHost, FakeGateway, FakeStore>;

    fn orchestrator(
        host: Option<FakeHost>,
        gateway: Option<FakeGateway>,
        store: Option<FakeStore>,
    ) -> (
        TestOrchestrator,
        Option<Arc<FakeHost>>,
        Option<Arc<FakeGateway>>,
        Option<Arc<FakeStore>>,
    ) {
        let host = host.map(Arc::new);
        let gateway = gateway.map(Arc::new);
        let store = store.map(Arc::new);
        let orchestrator = AnalysisOrchestrator::new(
            ImageIntake::new(IntakeConfig::default()),
            host.clone(),
            gateway.clone(),
            store.clone(),
            PipelineConfig::default(),
        );
        (orchestrator, host, gateway, store)
    }

    #[tokio::test]
    async fn test_complete_pipeline() {
        let (orch, _, _, store) = orchestrator(
            Some(FakeHost::default()),
            Some(FakeGateway::default()),
            Some(FakeStore::default()),
        );

        let outcome = orch
            .run(png_upload(Some("abc")), IdentityPolicy::Required)
            .await
            .unwrap();

        assert_eq!(outcome.state, PipelineState::Complete);
        assert!(!outcome.is_degraded());
        assert!(outcome.image_url.is_some());
        assert!(outcome.image_id.is_some());
        assert!(outcome.message.is_none());
        assert!(outcome.persist_warning.is_none());
        assert_eq!(outcome.model_version.as_deref(), Some("fake-model-v1"));

        // 量表与推理输出一致：同样的长度和标题集合，评分为区间内整数
        assert_eq!(outcome.scales.len(), catalog::CATALOG_SIZE);
        let titles: Vec<_> = outcome.scales.iter().map(|s| s.title.clone()).collect();
        assert_eq!(titles, catalog::catalog_titles());
        assert!(outcome.scales.iter().all(|s| (0..=5).contains(&s.rating)));
        assert!(outcome.scales.iter().all(|s| s.rating == 4));

        // 两次写入：图像记录 + 分析结果
        assert_eq!(store.as_ref().unwrap().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persist_then_retrieve_roundtrip() {
        let (orch, _, _, store) = orchestrator(
            Some(FakeHost::default()),
            Some(FakeGateway::default()),
            Some(FakeStore::default()),
        );

        let outcome = orch
            .run(png_upload(Some("abc")), IdentityPolicy::Required)
            .await
            .unwrap();

        let store = store.unwrap();
        let image_id = outcome.image_id.unwrap();
        let stored = store.get_analysis(image_id).await.unwrap().unwrap();

        // 经过序列化边界往返后结构保持一致，评分始终是整数
        assert_eq!(stored.image_id, image_id);
        assert_eq!(stored.scales, outcome.scales);
        assert!(!stored.degraded);
        assert_eq!(stored.model_version, outcome.model_version);

        let image = store.get_image(image_id).await.unwrap().unwrap();
        assert_eq!(image.user_id, "abc");
        assert_eq!(image.image_url, outcome.image_url);
    }

    #[tokio::test]
    async fn test_missing_identity_rejected_before_any_gateway() {
        let (orch, host, gateway, store) = orchestrator(
            Some(FakeHost::default()),
            Some(FakeGateway::default()),
            Some(FakeStore::default()),
        );

        let err = orch
            .run(png_upload(None), IdentityPolicy::Required)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingIdentity));
        // 验证失败路径上三个网关都不能被触碰
        assert_eq!(host.unwrap().calls.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.unwrap().calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.unwrap().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_image_rejected_before_any_gateway() {
        let (orch, host, gateway, store) = orchestrator(
            Some(FakeHost::default()),
            Some(FakeGateway::default()),
            Some(FakeStore::default()),
        );

        let mut raw = png_upload(Some("abc"));
        raw.bytes.resize(6 * 1024 * 1024, 0);
        let err = orch.run(raw, IdentityPolicy::Required).await.unwrap_err();

        assert!(matches!(err, AppError::TooLarge { .. }));
        assert_eq!(host.unwrap().calls.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.unwrap().calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.unwrap().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inference_failure_degrades_to_catalog() {
        let (orch, _, _, store) = orchestrator(
            Some(FakeHost::default()),
            Some(FakeGateway {
                fail: true,
                ..Default::default()
            }),
            Some(FakeStore::default()),
        );

        let outcome = orch
            .run(png_upload(Some("abc")), IdentityPolicy::Required)
            .await
            .unwrap();

        assert_eq!(outcome.state, PipelineState::DegradedInferring);
        assert!(outcome.is_degraded());
        // 14项目录默认值 + 非空降级说明
        assert_eq!(outcome.scales, catalog::default_scales());
        assert!(!outcome.message.as_deref().unwrap().is_empty());
        assert!(outcome.model_version.is_none());

        // 降级结果同样落库，且带降级标记
        let stored = store
            .unwrap()
            .get_analysis(outcome.image_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(stored.degraded);
    }

    #[tokio::test]
    async fn test_upload_failure_skips_inference_when_gateway_needs_url() {
        let (orch, _, gateway, _) = orchestrator(
            Some(FakeHost {
                fail: true,
                ..Default::default()
            }),
            Some(FakeGateway::default()),
            Some(FakeStore::default()),
        );

        let outcome = orch
            .run(png_upload(Some("abc")), IdentityPolicy::Required)
            .await
            .unwrap();

        assert_eq!(outcome.state, PipelineState::DegradedUploading);
        assert!(outcome.image_url.is_none());
        assert_eq!(outcome.scales, catalog::default_scales());
        assert!(!outcome.message.as_deref().unwrap().is_empty());
        // 网关只接受URL，托管失败后不应被调用
        assert_eq!(gateway.unwrap().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_continues_with_raw_bytes_when_supported() {
        let (orch, _, gateway, _) = orchestrator(
            Some(FakeHost {
                fail: true,
                ..Default::default()
            }),
            Some(FakeGateway {
                raw_bytes: true,
                ..Default::default()
            }),
            Some(FakeStore::default()),
        );

        let outcome = orch
            .run(png_upload(Some("abc")), IdentityPolicy::Required)
            .await
            .unwrap();

        // 推理基于原始字节完成：结果是真实的，但托管地址为空且附带说明
        assert_eq!(outcome.state, PipelineState::Complete);
        assert!(outcome.image_url.is_none());
        assert!(outcome.scales.iter().all(|s| s.rating == 4));
        assert!(!outcome.message.as_deref().unwrap().is_empty());
        assert_eq!(gateway.unwrap().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_timeout_degrades_instead_of_blocking() {
        let (orch, _, _, _) = orchestrator(
            Some(FakeHost {
                hang: true,
                ..Default::default()
            }),
            Some(FakeGateway::default()),
            Some(FakeStore::default()),
        );

        let outcome = orch
            .run(png_upload(Some("abc")), IdentityPolicy::Required)
            .await
            .unwrap();

        assert_eq!(outcome.state, PipelineState::DegradedUploading);
        assert!(outcome.image_url.is_none());
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_result() {
        let (orch, _, _, _) = orchestrator(
            Some(FakeHost::default()),
            Some(FakeGateway::default()),
            Some(FakeStore {
                fail: true,
                ..Default::default()
            }),
        );

        let outcome = orch
            .run(png_upload(Some("abc")), IdentityPolicy::Required)
            .await
            .unwrap();

        // 持久化失败不回滚已计算的结果，调用方视角仍是Complete
        assert_eq!(outcome.state, PipelineState::Complete);
        assert!(outcome.scales.iter().all(|s| s.rating == 4));
        assert!(outcome.persist_warning.is_some());
        assert!(outcome.image_id.is_none());
    }

    #[tokio::test]
    async fn test_missing_gateways_degrade_gracefully() {
        let (orch, _, _, _) = orchestrator(None, None, None);

        let outcome = orch
            .run(png_upload(Some("abc")), IdentityPolicy::Required)
            .await
            .unwrap();

        // 什么依赖都没有也能给出目录默认分析
        assert!(outcome.is_degraded());
        assert_eq!(outcome.scales, catalog::default_scales());
        assert!(outcome.message.is_some());
        assert!(outcome.image_id.is_none());
    }

    #[tokio::test]
    async fn test_anonymous_pipeline_records_placeholder_identity() {
        let (orch, _, _, store) = orchestrator(
            Some(FakeHost::default()),
            Some(FakeGateway::default()),
            Some(FakeStore::default()),
        );

        let outcome = orch
            .run(png_upload(None), IdentityPolicy::Optional)
            .await
            .unwrap();

        let image = store
            .unwrap()
            .get_image(outcome.image_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(image.user_id, "anonymous");
    }
}
