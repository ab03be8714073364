//! Shared LLM plumbing for the agents.
//!
//! One macro handles provider matching and retry in a central place so
//! the agents only name their output type, prompt and input.

/// Run an `LlmFunction` against the configured provider, retrying
/// transient failures under the given [`crate::retry::RetryPolicy`].
#[macro_export]
macro_rules! run_llm {
    ($retry:expr, $config:expr, $output_type:ty, $system_prompt:expr, $input:expr) => {{
        use radkit::agent::LlmFunction;
        use radkit::models::providers::{
            AnthropicLlm, DeepSeekLlm, GeminiLlm, GrokLlm, OpenAILlm, OpenRouterLlm,
        };
        use $crate::models::LlmProvider;

        let retry = $retry;
        let config = $config;
        let input: String = $input.to_string();
        let result: anyhow::Result<$output_type> = retry
            .run(|| {
                let input = input.clone();
                async move {
                    let result: anyhow::Result<$output_type> = match config.provider {
                        LlmProvider::Anthropic => {
                            let llm = AnthropicLlm::from_env(&config.model)?;
                            let func = LlmFunction::<$output_type>::new_with_system_instructions(
                                llm,
                                $system_prompt,
                            );
                            func.run(input.as_str()).await.map_err(Into::into)
                        }
                        LlmProvider::OpenAI => {
                            let mut llm = OpenAILlm::from_env(&config.model)?;
                            if let Some(base_url) = &config.base_url {
                                llm = llm.with_base_url(base_url);
                            }
                            let func = LlmFunction::<$output_type>::new_with_system_instructions(
                                llm,
                                $system_prompt,
                            );
                            func.run(input.as_str()).await.map_err(Into::into)
                        }
                        LlmProvider::Gemini => {
                            let llm = GeminiLlm::from_env(&config.model)?;
                            let func = LlmFunction::<$output_type>::new_with_system_instructions(
                                llm,
                                $system_prompt,
                            );
                            func.run(input.as_str()).await.map_err(Into::into)
                        }
                        LlmProvider::OpenRouter => {
                            let llm = OpenRouterLlm::from_env(&config.model)?;
                            let func = LlmFunction::<$output_type>::new_with_system_instructions(
                                llm,
                                $system_prompt,
                            );
                            func.run(input.as_str()).await.map_err(Into::into)
                        }
                        LlmProvider::Grok => {
                            let llm = GrokLlm::from_env(&config.model)?;
                            let func = LlmFunction::<$output_type>::new_with_system_instructions(
                                llm,
                                $system_prompt,
                            );
                            func.run(input.as_str()).await.map_err(Into::into)
                        }
                        LlmProvider::DeepSeek => {
                            let llm = DeepSeekLlm::from_env(&config.model)?;
                            let func = LlmFunction::<$output_type>::new_with_system_instructions(
                                llm,
                                $system_prompt,
                            );
                            func.run(input.as_str()).await.map_err(Into::into)
                        }
                    };
                    result
                }
            })
            .await;
        result
    }};
}

pub use run_llm;
