//! Query paraphrasing, grounded answer generation and the conversational
//! [`Assistant`] that ties them to the retrieval pipeline.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{ChatMessage, TextGenerator};
use crate::pipeline::RetrievalPipeline;
use crate::rerank::RankedResult;

/// How a user query is rewritten before searching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParaphraseMode {
    /// One clearer rewrite of the query.
    #[default]
    Simplify,
    /// Five rewrites, each focused on a different aspect.
    Expand,
}

impl ParaphraseMode {
    /// Number of variants the model is asked for.
    pub fn variant_count(self) -> usize {
        match self {
            Self::Simplify => 1,
            Self::Expand => 5,
        }
    }

    fn system_prompt(self) -> String {
        let task = match self {
            Self::Simplify => "Rewrite the user's query as 1 search query.".to_owned(),
            Self::Expand => format!(
                "Rewrite the user's query as {} search queries, each focused on a \
                 different aspect or subtopic of the original question.",
                self.variant_count()
            ),
        };
        format!(
            "You rewrite user queries so they work well in a web search engine. {task}\n\n\
             Requirements:\n\
             - Keep the original meaning.\n\
             - If the query is short or vague, add enough detail to make its intent clear.\n\
             - Do not let additions change the meaning.\n\
             - Phrase each query naturally, the way people type into a search box.\n\n\
             Format:\n\
             - A numbered list, one query per line."
        )
    }

    fn examples(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Simplify => &[
                ("where to find books on python", "1. Best sites to download Python books"),
                ("how to cook borscht", "1. Step-by-step borscht recipe"),
                ("why is the internet not working", "1. Reasons the internet connection stops working"),
            ],
            Self::Expand => &[
                (
                    "how to learn python",
                    "1. How to learn Python for data analysis\n\
                     2. How to learn Python from scratch for beginners\n\
                     3. Best online resources for learning Python\n\
                     4. How to learn Python for web development\n\
                     5. Where to start learning Python for task automation",
                ),
                (
                    "apple",
                    "1. History of Apple Inc.\n\
                     2. iPhone advantages compared to Android\n\
                     3. Health benefits of apples\n\
                     4. Current Apple stock price\n\
                     5. How to grow an apple tree",
                ),
            ],
        }
    }
}

/// Few-shot chat prompt asking for paraphrases of `query`.
pub fn build_paraphrase_messages(query: &str, mode: ParaphraseMode) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(mode.system_prompt())];
    for (input, output) in mode.examples() {
        messages.push(ChatMessage::user(*input));
        messages.push(ChatMessage::assistant(*output));
    }
    messages.push(ChatMessage::user(query));
    messages
}

/// Extract queries from a numbered-list reply.
///
/// Keeps lines that start with a digit, strips `1.`, `1)` or `1-` style
/// prefixes, and drops anything left empty.
pub fn parse_paraphrases(reply: &str) -> Vec<String> {
    reply
        .lines()
        .filter(|line| line.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .filter_map(|line| {
            let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
            let text = match rest.strip_prefix(['.', '-', ')']) {
                Some(stripped) => stripped.trim(),
                // No list marker: the digits belong to the query itself.
                None => line.trim(),
            };
            (!text.is_empty()).then(|| text.to_owned())
        })
        .collect()
}

/// Ask the generator for paraphrases of `query`.
///
/// # Errors
///
/// Returns [`crate::PipelineError::Generation`] if the generator fails.
pub async fn paraphrase(
    generator: &dyn TextGenerator,
    query: &str,
    mode: ParaphraseMode,
) -> Result<Vec<String>> {
    let reply = generator
        .generate(&build_paraphrase_messages(query, mode))
        .await?;
    Ok(parse_paraphrases(&reply))
}

/// Paraphrase `query` for searching, falling back to the query as typed
/// when the generator fails or its reply has no usable lines.
pub async fn search_variants(
    generator: &dyn TextGenerator,
    query: &str,
    mode: ParaphraseMode,
) -> Vec<String> {
    match paraphrase(generator, query, mode).await {
        Ok(variants) if !variants.is_empty() => variants,
        Ok(_) => {
            debug!("paraphrase reply had no usable lines, searching the raw query");
            vec![query.to_owned()]
        }
        Err(e) => {
            warn!(error = %e, "paraphrase failed, searching the raw query");
            vec![query.to_owned()]
        }
    }
}

/// Render ranked results as prompt context, one block per source.
pub fn format_context(results: &[RankedResult]) -> String {
    results
        .iter()
        .map(|result| {
            let domain = websift_search::domain_of(&result.source_url)
                .unwrap_or_else(|| result.source_url.clone());
            format!("{domain}:\n{}\nURL: {}", result.text, result.source_url)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

const ANSWER_INSTRUCTIONS: &str = "Answer the user's question using only the web results \
below. Do not use any other sources or your own memory. Cite the source URL for every \
piece of information you use. If the results do not contain the answer, say so.";

/// Chat prompt for a grounded answer. History goes between the
/// instructions and the final question.
pub fn build_answer_messages(
    query: &str,
    results: &[RankedResult],
    history: &[ChatMessage],
) -> Vec<ChatMessage> {
    let context = format_context(results);
    let context = if context.is_empty() {
        "none".to_owned()
    } else {
        context
    };

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(format!(
        "{ANSWER_INSTRUCTIONS}\n\nWeb results:\n{context}"
    )));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(query));
    messages
}

/// Generate an answer to `query` grounded in `results`.
///
/// # Errors
///
/// Returns [`crate::PipelineError::Generation`] if the generator fails.
pub async fn generate_answer(
    generator: &dyn TextGenerator,
    query: &str,
    results: &[RankedResult],
    history: &[ChatMessage],
) -> Result<String> {
    let reply = generator
        .generate(&build_answer_messages(query, results, history))
        .await?;
    Ok(reply.trim().to_owned())
}

/// One answered question.
#[derive(Debug, Clone)]
pub struct AssistantReply {
    pub answer: String,
    /// Queries actually sent to the search backends.
    pub variants: Vec<String>,
    /// Sources the answer was grounded in, in selection order.
    pub sources: Vec<RankedResult>,
}

/// Paraphrase → retrieve → answer, with bounded conversation history.
pub struct Assistant {
    pipeline: RetrievalPipeline,
    generator: Arc<dyn TextGenerator>,
    mode: ParaphraseMode,
    max_history_turns: usize,
    history: VecDeque<ChatMessage>,
}

impl Assistant {
    pub fn new(
        pipeline: RetrievalPipeline,
        generator: Arc<dyn TextGenerator>,
        mode: ParaphraseMode,
        max_history_turns: usize,
    ) -> Self {
        Self {
            pipeline,
            generator,
            mode,
            max_history_turns,
            history: VecDeque::new(),
        }
    }

    /// Conversation so far, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.history.iter()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Answer one question and record the exchange in the history.
    ///
    /// A paraphrase failure falls back to searching the query as typed.
    ///
    /// # Errors
    ///
    /// Propagates configuration, embedding and answer-generation errors.
    pub async fn ask(&mut self, query: &str) -> Result<AssistantReply> {
        let variants = search_variants(self.generator.as_ref(), query, self.mode).await;
        tracing::trace!(?variants, "search variants");

        let sources = self.pipeline.retrieve(query, &variants).await?;
        let history: Vec<ChatMessage> = self.history.iter().cloned().collect();
        let answer =
            generate_answer(self.generator.as_ref(), query, &sources, &history).await?;

        self.remember(query, &answer);
        Ok(AssistantReply {
            answer,
            variants,
            sources,
        })
    }

    fn remember(&mut self, query: &str, answer: &str) {
        if self.max_history_turns == 0 {
            return;
        }
        self.history.push_back(ChatMessage::user(query));
        self.history.push_back(ChatMessage::assistant(answer));
        while self.history.len() > self.max_history_turns * 2 {
            self.history.pop_front();
        }
    }
}
