//! Runtime configuration from environment variables
//!
//! | Variable          | Default                                                        |
//! |-------------------|----------------------------------------------------------------|
//! | `DATA_DIR`        | unset: catalogs compiled into the binary                       |
//! | `PORT`            | `3001`                                                         |
//! | `GEMINI_API_KEY`  | unset: AI advisor disabled, rule-based only                    |
//! | `GEMINI_MODEL`    | `gemini-flash-latest`                                          |
//! | `HF_API_TOKEN`    | unset: anonymous Hugging Face requests                         |
//! | `HF_VISION_MODEL` | `linkanjarad/mobilenet_v2_1.0_224-plant-disease-identification` |
//! | `VISION_BACKEND`  | `huggingface` (or `gemini`)                                    |
//! | `AI_TIMEOUT_SECS` | `12`                                                           |

use crate::adapters::{
    gemini, huggingface, AIRecommendationAdapter, GeminiClient, GenerativeModel, HuggingFaceClassifier,
    LlmVisionBackend, VisionBackend, VisionDiagnosisAdapter,
};
use crate::data::KnowledgeBase;
use crate::orchestrator::{RecommendationOrchestrator, DEFAULT_AI_TIMEOUT};
use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;

/// Which service diagnoses photos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionBackendKind {
    HuggingFace,
    Gemini,
}

impl FromStr for VisionBackendKind {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "huggingface" | "hf" => Ok(VisionBackendKind::HuggingFace),
            "gemini" => Ok(VisionBackendKind::Gemini),
            other => Err(anyhow!("unknown vision backend '{}' (expected huggingface or gemini)", other)),
        }
    }
}

/// Engine and server configuration
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Directory holding `crops.json` and `diseases.json`
    pub data_dir: Option<PathBuf>,
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub hf_api_token: Option<String>,
    pub hf_vision_model: String,
    pub vision_backend: VisionBackendKind,
    pub ai_timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            port: DEFAULT_PORT,
            gemini_api_key: None,
            gemini_model: gemini::DEFAULT_MODEL.to_string(),
            hf_api_token: None,
            hf_vision_model: huggingface::DEFAULT_MODEL.to_string(),
            vision_backend: VisionBackendKind::HuggingFace,
            ai_timeout: DEFAULT_AI_TIMEOUT,
        }
    }
}

impl AdvisorConfig {
    /// Read the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().with_context(|| format!("Invalid PORT: {}", raw))?,
            None => defaults.port,
        };

        let ai_timeout = match get("AI_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("Invalid AI_TIMEOUT_SECS: {}", raw))?;
                if secs == 0 {
                    bail!("AI_TIMEOUT_SECS must be at least 1");
                }
                Duration::from_secs(secs)
            }
            None => defaults.ai_timeout,
        };

        let vision_backend = match get("VISION_BACKEND") {
            Some(raw) => raw.parse().context("Invalid VISION_BACKEND")?,
            None => defaults.vision_backend,
        };

        Ok(Self {
            data_dir: get("DATA_DIR").map(PathBuf::from),
            port,
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            hf_api_token: get("HF_API_TOKEN"),
            hf_vision_model: get("HF_VISION_MODEL").unwrap_or(defaults.hf_vision_model),
            vision_backend,
            ai_timeout,
        })
    }

    /// Log the effective configuration (secrets reduced to set/unset)
    pub fn log_summary(&self) {
        let set = |v: &Option<String>| if v.is_some() { "set" } else { "unset" };
        tracing::info!("Configuration:");
        match &self.data_dir {
            Some(dir) => tracing::info!("  DATA_DIR: {}", dir.display()),
            None => tracing::info!("  DATA_DIR: (bundled catalogs)"),
        }
        tracing::info!("  PORT: {}", self.port);
        tracing::info!("  GEMINI_API_KEY: {}", set(&self.gemini_api_key));
        tracing::info!("  GEMINI_MODEL: {}", self.gemini_model);
        tracing::info!("  HF_API_TOKEN: {}", set(&self.hf_api_token));
        tracing::info!("  HF_VISION_MODEL: {}", self.hf_vision_model);
        tracing::info!("  VISION_BACKEND: {:?}", self.vision_backend);
        tracing::info!("  AI_TIMEOUT_SECS: {}", self.ai_timeout.as_secs());
    }

    /// Catalogs from `DATA_DIR`, or the bundled ones
    pub fn load_knowledge_base(&self) -> Result<KnowledgeBase> {
        match &self.data_dir {
            Some(dir) => KnowledgeBase::load(dir),
            None => {
                let kb = KnowledgeBase::bundled().context("Bundled knowledge base is invalid")?;
                tracing::info!("Loaded bundled knowledge base");
                tracing::info!("  Crops: {}", kb.crops().len());
                tracing::info!("  Diseases: {}", kb.diseases().len());
                Ok(kb)
            }
        }
    }

    fn gemini_client(&self) -> Option<GeminiClient> {
        self.gemini_api_key
            .as_ref()
            .map(|key| GeminiClient::new(key.clone(), self.gemini_model.clone()))
    }

    /// Wire adapters for whichever services are configured
    pub fn build_orchestrator(&self, kb: Arc<KnowledgeBase>) -> RecommendationOrchestrator {
        let mut orchestrator = RecommendationOrchestrator::new(kb);

        match self.gemini_client() {
            Some(client) => {
                let model: Arc<dyn GenerativeModel> = Arc::new(client);
                orchestrator = orchestrator.with_advisor(AIRecommendationAdapter::new(model, self.ai_timeout));
            }
            None => tracing::warn!("GEMINI_API_KEY not set: crop recommendations will be rule-based only"),
        }

        let backend: Option<Arc<dyn VisionBackend>> = match self.vision_backend {
            VisionBackendKind::HuggingFace => {
                let mut classifier = HuggingFaceClassifier::new(self.hf_vision_model.clone());
                if let Some(token) = &self.hf_api_token {
                    classifier = classifier.with_token(token.clone());
                }
                Some(Arc::new(classifier) as Arc<dyn VisionBackend>)
            }
            VisionBackendKind::Gemini => self.gemini_client().map(|client| {
                let model: Arc<dyn GenerativeModel> = Arc::new(client);
                Arc::new(LlmVisionBackend::new(model)) as Arc<dyn VisionBackend>
            }),
        };

        match backend {
            Some(backend) => orchestrator.with_vision(VisionDiagnosisAdapter::new(backend, self.ai_timeout)),
            None => {
                tracing::warn!("Vision backend unavailable: photo diagnosis will need symptoms");
                orchestrator
            }
        }
    }
}
