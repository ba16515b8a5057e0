//! Revalidation dispatcher: authenticated change notifications in, cache
//! invalidations out.

mod rules;

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use sitewire_api_types::WebhookPayload;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{info, warn};

use crate::application::repos::{InvalidationError, TagInvalidator};
use crate::domain::{error::DomainError, notification::ChangeNotification, tags::CacheTag};

pub use rules::{InvalidationRule, mapped_content_types, rule_for};

const METRIC_REVALIDATION_TOTAL: &str = "sitewire_revalidation_total";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is missing")]
    Missing,
    #[error("signature header is malformed: {0}")]
    Malformed(&'static str),
    #[error("signature does not match payload")]
    Mismatch,
}

/// Authenticates webhook deliveries.
///
/// A successful verification returns only after the content repository's
/// eventual-consistency window has elapsed, so a fetch issued afterwards
/// observes the change.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(
        &self,
        secret: &str,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), SignatureError>;
}

#[derive(Debug, Error)]
pub enum RevalidationError {
    #[error("webhook secret is not configured")]
    MissingSecret,
    #[error("signature verification failed: {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Invalidation(#[from] InvalidationError),
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

impl From<DomainError> for RevalidationError {
    fn from(err: DomainError) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

impl RevalidationError {
    fn outcome_label(&self) -> &'static str {
        match self {
            RevalidationError::MissingSecret => "missing_secret",
            RevalidationError::InvalidSignature(_) => "invalid_signature",
            RevalidationError::InvalidPayload(_) => "invalid_payload",
            RevalidationError::Invalidation(_) | RevalidationError::Timestamp(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevalidationOutcome {
    /// The content type has no rule; nothing was invalidated.
    NoRule { content_type: String },
    Revalidated {
        content_type: String,
        tags: Vec<CacheTag>,
        timestamp: String,
    },
}

#[derive(Clone)]
pub struct RevalidationService {
    secret: Option<String>,
    verifier: Arc<dyn SignatureVerifier>,
    invalidator: Arc<dyn TagInvalidator>,
}

impl RevalidationService {
    pub fn new(
        secret: Option<String>,
        verifier: Arc<dyn SignatureVerifier>,
        invalidator: Arc<dyn TagInvalidator>,
    ) -> Self {
        let secret = secret.filter(|value| !value.trim().is_empty());
        Self {
            secret,
            verifier,
            invalidator,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Handle one webhook delivery given its signature header and raw body.
    pub async fn handle(
        &self,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<RevalidationOutcome, RevalidationError> {
        let result = self.dispatch(signature, body).await;
        let outcome = match &result {
            Ok(RevalidationOutcome::NoRule { .. }) => "no_rule",
            Ok(RevalidationOutcome::Revalidated { .. }) => "revalidated",
            Err(err) => err.outcome_label(),
        };
        counter!(METRIC_REVALIDATION_TOTAL, "outcome" => outcome).increment(1);
        result
    }

    async fn dispatch(
        &self,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<RevalidationOutcome, RevalidationError> {
        let secret = self
            .secret
            .as_deref()
            .ok_or(RevalidationError::MissingSecret)?;

        self.verifier.verify(secret, signature, body).await?;

        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|err| RevalidationError::InvalidPayload(err.to_string()))?;
        let notification = ChangeNotification::try_from(payload)?;

        let Some(rule) = rule_for(&notification.content_type) else {
            info!(
                target = "sitewire::revalidation",
                content_type = %notification.content_type,
                "no revalidation rule for content type"
            );
            return Ok(RevalidationOutcome::NoRule {
                content_type: notification.content_type,
            });
        };

        let tags = rule.apply(&notification);
        for tag in &tags {
            if let Err(err) = self.invalidator.invalidate_tag(tag).await {
                warn!(
                    target = "sitewire::revalidation",
                    content_type = %notification.content_type,
                    tag = %tag,
                    error = %err,
                    "tag invalidation failed"
                );
                return Err(err.into());
            }
        }

        let timestamp = OffsetDateTime::now_utc().format(&Rfc3339)?;
        info!(
            target = "sitewire::revalidation",
            content_type = %notification.content_type,
            document_id = notification.document_id.as_deref().unwrap_or(""),
            tags = ?tags.iter().map(CacheTag::as_str).collect::<Vec<_>>(),
            "revalidated"
        );

        Ok(RevalidationOutcome::Revalidated {
            content_type: notification.content_type,
            tags,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct StaticVerifier {
        accept: bool,
    }

    #[async_trait]
    impl SignatureVerifier for StaticVerifier {
        async fn verify(
            &self,
            _secret: &str,
            signature: Option<&str>,
            _body: &[u8],
        ) -> Result<(), SignatureError> {
            match (signature, self.accept) {
                (None, _) => Err(SignatureError::Missing),
                (Some(_), true) => Ok(()),
                (Some(_), false) => Err(SignatureError::Mismatch),
            }
        }
    }

    #[derive(Default)]
    struct RecordingInvalidator {
        seen: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl TagInvalidator for RecordingInvalidator {
        async fn invalidate_tag(&self, tag: &CacheTag) -> Result<usize, InvalidationError> {
            if self.fail_on == Some(tag.as_str()) {
                return Err(InvalidationError::Store {
                    tag: tag.to_string(),
                    message: "store offline".to_string(),
                });
            }
            self.seen.lock().expect("lock").push(tag.to_string());
            Ok(1)
        }
    }

    fn service(
        secret: Option<&str>,
        accept: bool,
        invalidator: Arc<RecordingInvalidator>,
    ) -> RevalidationService {
        RevalidationService::new(
            secret.map(str::to_string),
            Arc::new(StaticVerifier { accept }),
            invalidator,
        )
    }

    const POST_BODY: &[u8] =
        br#"{ "_type": "post", "_id": "abc123", "slug": { "current": "my-post" } }"#;

    #[tokio::test]
    async fn missing_secret_fails_before_verification() {
        let invalidator = Arc::new(RecordingInvalidator::default());
        for secret in [None, Some("  ")] {
            let err = service(secret, true, invalidator.clone())
                .handle(Some("t=1,v1=sig"), POST_BODY)
                .await
                .expect_err("missing secret");
            assert!(matches!(err, RevalidationError::MissingSecret));
        }
        assert!(invalidator.seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn rejected_signature_invalidates_nothing() {
        let invalidator = Arc::new(RecordingInvalidator::default());
        let svc = service(Some("secret"), false, invalidator.clone());

        let err = svc
            .handle(Some("t=1,v1=forged"), POST_BODY)
            .await
            .expect_err("bad signature");
        assert!(matches!(
            err,
            RevalidationError::InvalidSignature(SignatureError::Mismatch)
        ));

        let err = svc.handle(None, POST_BODY).await.expect_err("no signature");
        assert!(matches!(
            err,
            RevalidationError::InvalidSignature(SignatureError::Missing)
        ));
        assert!(invalidator.seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn payload_without_type_is_invalid() {
        let invalidator = Arc::new(RecordingInvalidator::default());
        let svc = service(Some("secret"), true, invalidator);

        for body in [&br#"{ "_id": "abc123" }"#[..], &b"not json"[..]] {
            let err = svc.handle(Some("sig"), body).await.expect_err("invalid");
            assert!(matches!(err, RevalidationError::InvalidPayload(_)));
        }
    }

    #[tokio::test]
    async fn unknown_type_is_a_no_op_success() {
        let invalidator = Arc::new(RecordingInvalidator::default());
        let svc = service(Some("secret"), true, invalidator.clone());

        let outcome = svc
            .handle(Some("sig"), br#"{ "_type": "unknownType", "_id": "x" }"#)
            .await
            .expect("no-op");
        assert_eq!(
            outcome,
            RevalidationOutcome::NoRule {
                content_type: "unknownType".to_string()
            }
        );
        assert!(invalidator.seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn mapped_type_invalidates_every_tag_in_order() {
        let invalidator = Arc::new(RecordingInvalidator::default());
        let svc = service(Some("secret"), true, invalidator.clone());

        let outcome = svc.handle(Some("sig"), POST_BODY).await.expect("revalidated");
        let RevalidationOutcome::Revalidated {
            content_type,
            tags,
            timestamp,
        } = outcome
        else {
            panic!("expected revalidation");
        };

        assert_eq!(content_type, "post");
        let expected = vec!["post", "posts", "latestPosts", "post-my-post"];
        assert_eq!(
            tags.iter().map(CacheTag::as_str).collect::<Vec<_>>(),
            expected
        );
        assert!(OffsetDateTime::parse(&timestamp, &Rfc3339).is_ok());
        assert_eq!(*invalidator.seen.lock().expect("lock"), expected);
    }

    #[tokio::test]
    async fn repeated_delivery_yields_the_same_tags() {
        let invalidator = Arc::new(RecordingInvalidator::default());
        let svc = service(Some("secret"), true, invalidator);

        let first = svc.handle(Some("sig"), POST_BODY).await.expect("first");
        let second = svc.handle(Some("sig"), POST_BODY).await.expect("second");

        let tags = |outcome: RevalidationOutcome| match outcome {
            RevalidationOutcome::Revalidated { tags, .. } => tags,
            RevalidationOutcome::NoRule { .. } => Vec::new(),
        };
        assert_eq!(tags(first), tags(second));
    }

    #[tokio::test]
    async fn partial_invalidation_fails_the_whole_request() {
        let invalidator = Arc::new(RecordingInvalidator {
            fail_on: Some("latestPosts"),
            ..Default::default()
        });
        let svc = service(Some("secret"), true, invalidator.clone());

        let err = svc.handle(Some("sig"), POST_BODY).await.expect_err("failed");
        assert!(matches!(err, RevalidationError::Invalidation(_)));
        assert_eq!(*invalidator.seen.lock().expect("lock"), vec!["post", "posts"]);
    }
}
