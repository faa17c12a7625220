//! Payloads of the simple one-shot forms, plus the multipart upload form.
//!
//! Field sets mirror what the site collects; required-ness mirrors the
//! forms themselves, with the deliberately loose email/phone checks from
//! [`crate::validation`].
use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use serde::Deserialize;
use validator::Validate;

use super::{loose_email, loose_phone};

#[derive(MultipartForm)]
pub struct UploadFileForm {
    // The 5 MiB admission limit is checked by the upload service so it can
    // answer with a structured error; this bound only stops runaway bodies.
    #[multipart(limit = "10MB")]
    pub file: TempFile,
}

/// General contact message.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1), custom(function = loose_email))]
    pub email: String,
    #[validate(custom(function = loose_phone))]
    pub phone: Option<String>,
    #[validate(length(min = 1))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub message: String,
}

/// Trial-training request. Email is optional and only checked when given.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct TrialTrainingForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1), custom(function = loose_phone))]
    pub phone: String,
    #[validate(custom(function = loose_email))]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub age: String,
}

/// Sponsor package inquiry.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct SponsorInquiryForm {
    #[validate(length(min = 1))]
    pub company_name: String,
    #[validate(length(min = 1))]
    pub contact_person: String,
    #[validate(length(min = 1), custom(function = loose_email))]
    pub email: String,
    #[validate(custom(function = loose_phone))]
    pub phone: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub package: String,
}

/// Donor-circle signup.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct DonorForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1), custom(function = loose_email))]
    pub email: String,
    #[validate(custom(function = loose_phone))]
    pub phone: Option<String>,
    pub extra_text: Option<String>,
}

fn push(pairs: &mut Vec<(String, String)>, key: &str, value: String) {
    pairs.push((key.to_string(), value));
}

fn push_opt(pairs: &mut Vec<(String, String)>, key: &str, value: Option<String>) {
    push(pairs, key, value.unwrap_or_default());
}

impl ContactForm {
    pub fn into_pairs(self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "name", self.name);
        push(&mut pairs, "email", self.email);
        push_opt(&mut pairs, "phone", self.phone);
        push(&mut pairs, "subject", self.subject);
        push(&mut pairs, "message", self.message);
        pairs
    }
}

impl TrialTrainingForm {
    pub fn into_pairs(self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "name", self.name);
        push(&mut pairs, "phone", self.phone);
        push_opt(&mut pairs, "email", self.email);
        push(&mut pairs, "age", self.age);
        pairs
    }
}

impl SponsorInquiryForm {
    pub fn into_pairs(self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "company_name", self.company_name);
        push(&mut pairs, "contact_person", self.contact_person);
        push(&mut pairs, "email", self.email);
        push_opt(&mut pairs, "phone", self.phone);
        push_opt(&mut pairs, "description", self.description);
        push(&mut pairs, "package", self.package);
        pairs
    }
}

impl DonorForm {
    pub fn into_pairs(self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "name", self.name);
        push(&mut pairs, "email", self.email);
        push_opt(&mut pairs, "phone", self.phone);
        push_opt(&mut pairs, "extra_text", self.extra_text);
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_form_requires_fields_but_tolerates_loose_email() {
        let form = ContactForm {
            name: "Jan".to_string(),
            email: "jan@voorbeeld.nl".to_string(),
            phone: None,
            subject: "Training".to_string(),
            message: "When can I join?".to_string(),
        };
        assert!(form.validate().is_ok());

        let bad = ContactForm {
            email: "jan@voorbeeld".to_string(),
            ..form
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn trial_form_skips_email_check_when_absent() {
        let form = TrialTrainingForm {
            name: "Jan".to_string(),
            phone: "06-12345678".to_string(),
            email: None,
            age: "15".to_string(),
        };
        assert!(form.validate().is_ok());

        let bad_phone = TrialTrainingForm {
            phone: "123".to_string(),
            ..form.clone()
        };
        assert!(bad_phone.validate().is_err());

        let bad_email = TrialTrainingForm {
            email: Some("nope".to_string()),
            ..form
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn sponsor_pairs_include_the_selected_package() {
        let form = SponsorInquiryForm {
            company_name: "Bakkerij Jansen".to_string(),
            contact_person: "Jan Jansen".to_string(),
            email: "jan@bakkerij.nl".to_string(),
            phone: None,
            description: None,
            package: "Scrum Master".to_string(),
        };
        let pairs = form.into_pairs();
        assert!(pairs.contains(&("package".to_string(), "Scrum Master".to_string())));
        assert!(pairs.contains(&("phone".to_string(), String::new())));
    }
}
