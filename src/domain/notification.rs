//! Change notifications emitted by the content repository.

use sitewire_api_types::WebhookPayload;

use super::error::DomainError;

/// A validated content-change event.
///
/// `content_type` is always present and non-blank. `slug` is only set for
/// documents that expose a public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    pub content_type: String,
    pub document_id: Option<String>,
    pub slug: Option<String>,
}

impl ChangeNotification {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            document_id: None,
            slug: None,
        }
    }

    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Slug when present and not blank.
    pub fn slug(&self) -> Option<&str> {
        self.slug
            .as_deref()
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
    }
}

impl TryFrom<WebhookPayload> for ChangeNotification {
    type Error = DomainError;

    fn try_from(payload: WebhookPayload) -> Result<Self, Self::Error> {
        let content_type = payload
            .content_type
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| DomainError::missing_field("_type"))?;

        Ok(Self {
            content_type,
            document_id: payload.document_id,
            slug: payload.slug.and_then(|slug| slug.current),
        })
    }
}

#[cfg(test)]
mod tests {
    use sitewire_api_types::SlugField;

    use super::*;

    #[test]
    fn missing_type_is_rejected() {
        let payload = WebhookPayload {
            document_id: Some("abc123".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ChangeNotification::try_from(payload),
            Err(DomainError::missing_field("_type"))
        );
    }

    #[test]
    fn blank_type_is_rejected() {
        let payload = WebhookPayload {
            content_type: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(ChangeNotification::try_from(payload).is_err());
    }

    #[test]
    fn slug_is_lifted_from_nested_field() {
        let payload = WebhookPayload {
            content_type: Some("service".to_string()),
            document_id: Some("svc-1".to_string()),
            slug: Some(SlugField {
                current: Some("grid-studies".to_string()),
            }),
        };
        let notification = ChangeNotification::try_from(payload).expect("valid");
        assert_eq!(notification.content_type, "service");
        assert_eq!(notification.slug(), Some("grid-studies"));
    }

    #[test]
    fn blank_slug_reads_as_absent() {
        let notification = ChangeNotification::new("post").with_slug(" ");
        assert_eq!(notification.slug(), None);
    }
}
