use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A message awaiting delivery.
///
/// Recipients keep the order they were supplied in and are not deduplicated;
/// only fingerprinting normalises their order. A `Message` is immutable once
/// built, so it is cheap to share across retries and providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    #[serde(alias = "to")]
    recipients: Arc<[String]>,
    subject: Arc<str>,
    body: Arc<str>,
}

impl Message {
    #[must_use]
    pub fn new<R, S>(recipients: R, subject: impl Into<String>, body: impl Into<String>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            recipients: recipients.into_iter().map(Into::into).collect(),
            subject: Arc::from(subject.into()),
            body: Arc::from(body.into()),
        }
    }

    /// Recipients in submission order
    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Recipients sorted lexicographically, leaving the message untouched
    #[must_use]
    pub fn sorted_recipients(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.recipients.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }
}
