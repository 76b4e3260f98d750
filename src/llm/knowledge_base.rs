//! Bedrock Knowledge Bases retrieval.

use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_bedrockagentruntime::{
    Client,
    error::DisplayErrorContext,
    types::{
        KnowledgeBaseQuery, KnowledgeBaseRetrievalConfiguration,
        KnowledgeBaseRetrievalResult, KnowledgeBaseVectorSearchConfiguration,
        RetrievalResultContent, RetrievalResultLocation,
    },
};
use log::debug;

use crate::error::{BotError, Result};
use crate::types::Passage;

use super::Retriever;

/// Retriever scoped to a single knowledge base, returning at most `top_k` passages.
pub struct KnowledgeBaseRetriever {
    client: Client,
    knowledge_base_id: String,
    top_k: i32,
}

impl KnowledgeBaseRetriever {
    #[must_use]
    pub fn new(
        config: &SdkConfig,
        knowledge_base_id: String,
        top_k: i32,
        region: Option<&str>,
    ) -> Self {
        let mut builder = aws_sdk_bedrockagentruntime::config::Builder::from(config);
        if let Some(region) = region {
            builder = builder.region(Region::new(region.to_string()));
        }
        Self {
            client: Client::from_conf(builder.build()),
            knowledge_base_id,
            top_k,
        }
    }
}

fn to_passage(result: &KnowledgeBaseRetrievalResult) -> Option<Passage> {
    let content: Option<&RetrievalResultContent> = result.content().into();
    let text: Option<&str> = content?.text().into();

    let location: Option<&RetrievalResultLocation> = result.location();
    let source = location
        .and_then(RetrievalResultLocation::s3_location)
        .and_then(|s3| s3.uri());

    passage(text, source, result.score())
}

/// Build a passage from retrieved text, skipping blank results.
fn passage(text: Option<&str>, source: Option<&str>, score: Option<f64>) -> Option<Passage> {
    let text = text.map(str::trim).filter(|text| !text.is_empty())?;
    Some(Passage {
        text: text.to_string(),
        source: source.map(ToString::to_string),
        score,
    })
}

fn retrieval_configuration(top_k: i32) -> Result<KnowledgeBaseRetrievalConfiguration> {
    Ok(KnowledgeBaseRetrievalConfiguration::builder()
        .vector_search_configuration(
            KnowledgeBaseVectorSearchConfiguration::builder()
                .number_of_results(top_k)
                .build(),
        )
        .build())
}

fn knowledge_base_error(err: impl std::error::Error) -> BotError {
    BotError::KnowledgeBase(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl Retriever for KnowledgeBaseRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>> {
        debug!(
            "Retrieving up to {} passages from knowledge base {}",
            self.top_k, self.knowledge_base_id
        );

        let retrieval_query = KnowledgeBaseQuery::builder()
            .text(query)
            .build()
            .map_err(knowledge_base_error)?;
        let retrieval_configuration = retrieval_configuration(self.top_k)?;

        let response = self
            .client
            .retrieve()
            .knowledge_base_id(&self.knowledge_base_id)
            .retrieval_query(retrieval_query)
            .retrieval_configuration(retrieval_configuration)
            .send()
            .await
            .map_err(knowledge_base_error)?;

        let passages: Vec<Passage> = response
            .retrieval_results()
            .iter()
            .filter_map(to_passage)
            .collect();

        debug!("Knowledge base returned {} passages", passages.len());
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatbot::KNOWLEDGE_BASE_TOP_K;

    #[test]
    fn vector_search_asks_for_top_k_results() {
        let config = retrieval_configuration(KNOWLEDGE_BASE_TOP_K).expect("valid configuration");
        let vector: Option<&KnowledgeBaseVectorSearchConfiguration> =
            config.vector_search_configuration().into();
        assert_eq!(vector.and_then(|v| v.number_of_results().into()), Some(4));
    }

    #[test]
    fn passage_keeps_trimmed_text_source_and_score() {
        let passage = passage(
            Some("  Refunds take 5 days.\n"),
            Some("s3://docs/refunds.md"),
            Some(0.82),
        )
        .expect("non-blank passage");

        assert_eq!(passage.text, "Refunds take 5 days.");
        assert_eq!(passage.source.as_deref(), Some("s3://docs/refunds.md"));
        assert_eq!(passage.score, Some(0.82));
    }

    #[test]
    fn blank_results_are_dropped() {
        assert!(passage(Some(" \n\t"), Some("s3://docs/empty.md"), Some(0.5)).is_none());
        assert!(passage(None, None, None).is_none());
    }

    #[test]
    fn passage_without_location_has_no_source() {
        let passage = passage(Some("text"), None, None).expect("non-blank passage");
        assert_eq!(passage.source, None);
        assert_eq!(passage.score, None);
    }
}
