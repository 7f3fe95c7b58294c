//! 摘要翻译服务 - 业务能力层
//!
//! 只负责"把一篇论文的标题和摘要翻译成中文"这一件事。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务，端点与模型由 [`TranslationConfig`] 显式传入，
//!   不修改任何全局状态

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::TranslateError;
use crate::services::metadata::PaperMeta;

/// 翻译后端配置：构造时显式传入，不依赖全局可变状态
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
}

impl TranslationConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.llm_api_key.clone(),
            api_base: config.llm_api_base_url.clone(),
            model: config.llm_model_name.clone(),
        }
    }
}

/// 翻译结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Translation {
    #[serde(default)]
    pub title_zh: String,
    #[serde(default)]
    pub abstract_zh: String,
    #[serde(default)]
    pub keywords_zh: Vec<String>,
    #[serde(default)]
    pub summary_zh: String,
}

/// 翻译后端接口
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, meta: &PaperMeta) -> Result<Translation, TranslateError>;
}

/// 基于 OpenAI 兼容 API 的翻译实现
pub struct OpenAiTranslator {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiTranslator {
    pub fn new(config: &TranslationConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.api_base);
        Self {
            client: Client::with_config(openai_config),
            model_name: config.model.clone(),
        }
    }

    /// 基础的 LLM 调用：一条 system + 一条 user，返回文本回复
    async fn send(&self, system_message: &str, user_message: &str) -> Result<String, TranslateError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()
            .map_err(|e| TranslateError::ApiCall {
                model: self.model_name.clone(),
                message: e.to_string(),
            })?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| TranslateError::ApiCall {
                model: self.model_name.clone(),
                message: e.to_string(),
            })?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.3)
            .max_tokens(2000u32)
            .build()
            .map_err(|e| TranslateError::ApiCall {
                model: self.model_name.clone(),
                message: e.to_string(),
            })?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            TranslateError::ApiCall {
                model: self.model_name.clone(),
                message: e.to_string(),
            }
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| TranslateError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl TranslationBackend for OpenAiTranslator {
    async fn translate(&self, meta: &PaperMeta) -> Result<Translation, TranslateError> {
        if meta.title.is_empty() && meta.abstract_text.is_empty() {
            return Ok(Translation::default());
        }

        let reply = self
            .send(SYSTEM_PROMPT, &build_prompt(&meta.title, &meta.abstract_text))
            .await?;
        Ok(parse_translation(&reply))
    }
}

const SYSTEM_PROMPT: &str =
    "你是一位专业的AI/ML领域学术论文翻译专家，擅长准确翻译英文论文并提取关键信息。";

fn build_prompt(title: &str, abstract_text: &str) -> String {
    format!(
        r#"请将以下学术论文的标题和摘要翻译成中文，并提供简短的中文总结和关键词。

【论文标题】
{title}

【摘要】
{abstract_text}

请按以下 JSON 格式返回（不要添加任何其他文字）：
{{
  "title_zh": "中文标题",
  "abstract_zh": "中文摘要",
  "keywords_zh": ["关键词1", "关键词2", "关键词3", "关键词4", "关键词5"],
  "summary_zh": "用2-3句话总结本文的核心贡献和意义"
}}"#
    )
}

/// 从 LLM 回复中提取 JSON 并解析。
/// 模型偶尔会在 JSON 外包一层说明文字或代码块标记，因此取第一个
/// `{` 到最后一个 `}` 之间的内容；完全解析失败时把原始回复当作
/// 摘要译文兜底，绝不让一次格式抖动变成论文级失败。
pub(crate) fn parse_translation(reply: &str) -> Translation {
    if let Some(json) = extract_json(reply) {
        if let Ok(t) = serde_json::from_str::<Translation>(json) {
            return t;
        }
    }
    Translation {
        abstract_zh: reply.to_string(),
        ..Default::default()
    }
}

fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}
