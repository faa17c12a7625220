//! Outbound delivery of form submissions to the external webhook.
//!
//! Everything is normalized to a delivered/failed outcome at this boundary:
//! transport errors, timeouts and non-2xx responses become a failed outcome,
//! never an error the caller has to unwind.
use std::time::Duration;

use reqwest::Client;
use uuid::Uuid;
use validator::Validate;

use crate::forms::submissions::{ContactForm, DonorForm, SponsorInquiryForm, TrialTrainingForm};
use crate::signup::ApplicationReport;

const RELAY_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("clubforms/", env!("CARGO_PKG_VERSION"));

/// One deliverable payload. The discriminator travels as `form_type` so the
/// webhook can dispatch without inspecting field names.
#[derive(Clone, Debug)]
pub enum Submission {
    Contact(ContactForm),
    TrialTraining(TrialTrainingForm),
    SponsorInquiry(SponsorInquiryForm),
    Donor(DonorForm),
    IncompleteApplication(ApplicationReport),
    CompleteApplication(ApplicationReport),
}

impl Submission {
    pub fn form_type(&self) -> &'static str {
        match self {
            Submission::Contact(_) => "contact",
            Submission::TrialTraining(_) => "trial-training",
            Submission::SponsorInquiry(_) => "sponsor",
            Submission::Donor(_) => "club-of-50",
            Submission::IncompleteApplication(_) => "membership-incomplete",
            Submission::CompleteApplication(_) => "membership-complete",
        }
    }

    /// Payload-shape check for the simple forms. Application reports are
    /// gated by the signup step validation instead.
    fn validate_payload(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            Submission::Contact(form) => form.validate(),
            Submission::TrialTraining(form) => form.validate(),
            Submission::SponsorInquiry(form) => form.validate(),
            Submission::Donor(form) => form.validate(),
            Submission::IncompleteApplication(_) | Submission::CompleteApplication(_) => Ok(()),
        }
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        let form_type = self.form_type().to_string();
        let mut pairs = vec![("form_type".to_string(), form_type)];
        pairs.extend(match self {
            Submission::Contact(form) => form.into_pairs(),
            Submission::TrialTraining(form) => form.into_pairs(),
            Submission::SponsorInquiry(form) => form.into_pairs(),
            Submission::Donor(form) => form.into_pairs(),
            Submission::IncompleteApplication(report) => report.into_pairs(),
            Submission::CompleteApplication(report) => report.into_pairs(),
        });
        pairs
    }
}

/// Normalized delivery result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RelayOutcome {
    Delivered { message_id: String },
    Failed { error: String },
}

impl RelayOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RelayOutcome::Delivered { .. })
    }
}

/// Client for the external webhook.
#[derive(Clone)]
pub struct SubmissionRelay {
    http: Client,
    webhook_url: String,
}

impl SubmissionRelay {
    pub fn new(webhook_url: String) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(RELAY_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, webhook_url })
    }

    /// Deliver a submission. Everything travels as a GET with query
    /// parameters except the complete membership application, which is
    /// POSTed as multipart to fit larger payloads.
    pub async fn deliver(&self, submission: Submission) -> RelayOutcome {
        if let Err(err) = submission.validate_payload() {
            return RelayOutcome::Failed {
                error: format!("invalid submission: {err}"),
            };
        }
        match submission {
            Submission::CompleteApplication(_) => {
                self.forward_multipart(submission.into_pairs()).await
            }
            _ => self.forward_pairs(&submission.into_pairs()).await,
        }
    }

    /// Forward an already encoded query string untouched.
    pub async fn forward_raw_query(&self, query: &str) -> RelayOutcome {
        let url = if query.is_empty() {
            self.webhook_url.clone()
        } else {
            format!("{}?{}", self.webhook_url, query)
        };
        self.finish(self.http.get(url).send().await).await
    }

    /// Forward key/value pairs as GET query parameters.
    pub async fn forward_pairs(&self, pairs: &[(String, String)]) -> RelayOutcome {
        self.finish(self.http.get(&self.webhook_url).query(pairs).send().await)
            .await
    }

    async fn forward_multipart(&self, pairs: Vec<(String, String)>) -> RelayOutcome {
        let mut form = reqwest::multipart::Form::new();
        for (key, value) in pairs {
            form = form.text(key, value);
        }
        self.finish(
            self.http
                .post(&self.webhook_url)
                .multipart(form)
                .send()
                .await,
        )
        .await
    }

    async fn finish(
        &self,
        sent: Result<reqwest::Response, reqwest::Error>,
    ) -> RelayOutcome {
        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                log::error!("webhook request failed: {err}");
                return RelayOutcome::Failed {
                    error: err.to_string(),
                };
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            log::error!("webhook responded with {status}: {body}");
            return RelayOutcome::Failed {
                error: format!("webhook error: {} - {}", status.as_u16(), body),
            };
        }

        log::debug!("webhook response: {body}");
        let message_id = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("messageId")
                    .and_then(|id| id.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        RelayOutcome::Delivered { message_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactForm {
        ContactForm {
            name: "Jan".to_string(),
            email: "jan@voorbeeld.nl".to_string(),
            phone: None,
            subject: "Training".to_string(),
            message: "When can I join?".to_string(),
        }
    }

    #[test]
    fn pairs_lead_with_the_form_type() {
        let pairs = Submission::Contact(contact()).into_pairs();
        assert_eq!(pairs[0], ("form_type".to_string(), "contact".to_string()));
        assert!(pairs.contains(&("subject".to_string(), "Training".to_string())));
    }

    #[tokio::test]
    async fn invalid_payload_fails_without_a_network_call() {
        // Unroutable webhook URL: reaching the network would error
        // differently than the validation message asserted here.
        let relay = SubmissionRelay::new("http://127.0.0.1:0/exec".to_string()).unwrap();
        let bad = ContactForm {
            email: "not-an-email".to_string(),
            ..contact()
        };

        let outcome = relay.deliver(Submission::Contact(bad)).await;
        let RelayOutcome::Failed { error } = outcome else {
            panic!("expected a failed outcome");
        };
        assert!(error.starts_with("invalid submission:"));
    }

    #[tokio::test]
    async fn unreachable_webhook_is_a_failed_outcome_not_a_panic() {
        let relay = SubmissionRelay::new("http://127.0.0.1:0/exec".to_string()).unwrap();

        let outcome = relay.deliver(Submission::Contact(contact())).await;
        assert!(!outcome.is_success());
    }

    #[test]
    fn form_types_are_stable() {
        let report = ApplicationReport {
            step: None,
            form: Default::default(),
            photo_url: None,
        };
        assert_eq!(
            Submission::CompleteApplication(report.clone()).form_type(),
            "membership-complete"
        );
        assert_eq!(
            Submission::IncompleteApplication(report).form_type(),
            "membership-incomplete"
        );
    }
}
