//! Multi-step membership signup form.
//!
//! The form survives page reloads: the whole state is written through to an
//! injected snapshot store after every mutation and restored wholesale on
//! open. Validation only runs when moving between steps, and reports every
//! missing field of the current step at once.
pub mod session;
pub mod snapshot;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::{is_valid_email, is_valid_phone};

pub use session::{SessionError, SignupSession};
pub use snapshot::{FormSnapshot, InMemoryStore, JsonFileStore, SnapshotError, SnapshotStore};

pub const MEMBERSHIP_TYPES: [&str; 5] = [
    "Basic membership",
    "Playing member",
    "Recreational",
    "Trial membership",
    "Training membership",
];

/// One of the four sequential field groups.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Step {
    Identity,
    Address,
    Payment,
    Membership,
}

impl Step {
    pub const FIRST: Step = Step::Identity;
    pub const LAST: Step = Step::Membership;

    pub fn number(self) -> u8 {
        match self {
            Step::Identity => 1,
            Step::Address => 2,
            Step::Payment => 3,
            Step::Membership => 4,
        }
    }

    /// Next step, capped at the last.
    pub fn next(self) -> Step {
        match self {
            Step::Identity => Step::Address,
            Step::Address => Step::Payment,
            Step::Payment | Step::Membership => Step::Membership,
        }
    }

    /// Previous step, floored at the first.
    pub fn prev(self) -> Step {
        match self {
            Step::Identity | Step::Address => Step::Identity,
            Step::Payment => Step::Address,
            Step::Membership => Step::Payment,
        }
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Step::Identity),
            2 => Ok(Step::Address),
            3 => Ok(Step::Payment),
            4 => Ok(Step::Membership),
            other => Err(format!("step out of range: {other}")),
        }
    }
}

/// Payment authorization choice. `Manual` is the default; choosing direct
/// debit gates the banking fields.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectDebit {
    Authorized,
    #[default]
    Manual,
}

/// Metadata of the attached passport photo. Bytes are uploaded separately;
/// only the descriptor is part of the persisted form.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PhotoAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

/// The in-progress application. All fields are plain strings as typed; no
/// field-level validation happens on mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationForm {
    pub first_name: String,
    pub last_name: String,
    /// ISO `YYYY-MM-DD`.
    pub birth_date: String,
    pub email: String,
    pub mobile: String,

    pub country: String,
    pub postcode: String,
    pub house_number: String,
    pub street: String,
    pub city: String,

    pub photo: Option<PhotoAttachment>,
    pub direct_debit: DirectDebit,
    pub iban: String,
    pub account_holder: String,
    pub mother_phone: String,
    pub father_phone: String,
    pub emergency_number: String,

    pub membership_type: String,
    pub minor_consent: bool,
    pub signature: String,
}

impl Default for ApplicationForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            birth_date: String::new(),
            email: String::new(),
            mobile: String::new(),
            country: "Netherlands".to_string(),
            postcode: String::new(),
            house_number: String::new(),
            street: String::new(),
            city: String::new(),
            photo: None,
            direct_debit: DirectDebit::default(),
            iban: String::new(),
            account_holder: String::new(),
            mother_phone: String::new(),
            father_phone: String::new(),
            emergency_number: String::new(),
            membership_type: MEMBERSHIP_TYPES[0].to_string(),
            minor_consent: false,
            signature: String::new(),
        }
    }
}

/// Tunable gate behavior for source inconsistencies surfaced as policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepPolicy {
    /// Also require street and city at the address step. The final gate
    /// requires them regardless.
    pub require_full_address_early: bool,
}

/// Step-transition validation failure, in reporting precedence order:
/// every missing field of the step first, then email shape, then phone
/// shape.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum StepError {
    #[error("required fields missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("enter a valid email address")]
    InvalidEmail,
    #[error("enter a valid phone number of at least 10 digits")]
    InvalidPhone,
}

impl ApplicationForm {
    /// Minor detection at month granularity: the day of the month is
    /// deliberately ignored, so someone is counted as adult for the whole
    /// of their 18th-birthday month. Unparseable dates count as adult.
    pub fn is_minor(&self, today: NaiveDate) -> bool {
        let Ok(birth) = NaiveDate::parse_from_str(&self.birth_date, "%Y-%m-%d") else {
            return false;
        };
        let age = today.year() - birth.year();
        let month_diff = today.month() as i32 - birth.month() as i32;
        age < 18 || (age == 18 && month_diff < 0)
    }

    /// Gate for leaving the given step.
    pub fn validate_step(
        &self,
        step: Step,
        policy: StepPolicy,
        today: NaiveDate,
    ) -> Result<(), StepError> {
        match step {
            Step::Identity => {
                let mut missing = Vec::new();
                require(&mut missing, "First name", &self.first_name);
                require(&mut missing, "Last name", &self.last_name);
                require(&mut missing, "Date of birth", &self.birth_date);
                require(&mut missing, "Email", &self.email);
                require(&mut missing, "Mobile number", &self.mobile);
                if !missing.is_empty() {
                    return Err(StepError::MissingFields(missing));
                }
                self.validate_reachability()
            }
            Step::Address => {
                let mut missing = Vec::new();
                require(&mut missing, "Postcode", &self.postcode);
                require(&mut missing, "House number", &self.house_number);
                if policy.require_full_address_early {
                    require(&mut missing, "Street", &self.street);
                    require(&mut missing, "City", &self.city);
                }
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(StepError::MissingFields(missing))
                }
            }
            Step::Payment => {
                let mut missing = Vec::new();
                if self.photo.is_none() {
                    missing.push("Passport photo");
                }
                if self.direct_debit == DirectDebit::Authorized {
                    require(&mut missing, "IBAN", &self.iban);
                    require(&mut missing, "Account holder", &self.account_holder);
                }
                if self.is_minor(today) {
                    require(&mut missing, "Mother's phone", &self.mother_phone);
                    require(&mut missing, "Father's phone", &self.father_phone);
                    require(&mut missing, "Emergency number", &self.emergency_number);
                }
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(StepError::MissingFields(missing))
                }
            }
            Step::Membership => self.validate_submission(),
        }
    }

    /// Final-submission gate: identity, full address, photo, and a
    /// signature of at least three characters.
    pub fn validate_submission(&self) -> Result<(), StepError> {
        let mut missing = Vec::new();
        require(&mut missing, "First name", &self.first_name);
        require(&mut missing, "Last name", &self.last_name);
        require(&mut missing, "Date of birth", &self.birth_date);
        require(&mut missing, "Email", &self.email);
        require(&mut missing, "Mobile number", &self.mobile);
        require(&mut missing, "Postcode", &self.postcode);
        require(&mut missing, "House number", &self.house_number);
        require(&mut missing, "Street", &self.street);
        require(&mut missing, "City", &self.city);
        if self.photo.is_none() {
            missing.push("Passport photo");
        }
        require(&mut missing, "Signature", &self.signature);
        if !self.signature.is_empty() && self.signature.chars().count() < 3 {
            missing.push("Signature (full name)");
        }
        if !missing.is_empty() {
            return Err(StepError::MissingFields(missing));
        }
        self.validate_reachability()
    }

    fn validate_reachability(&self) -> Result<(), StepError> {
        if !is_valid_email(&self.email) {
            return Err(StepError::InvalidEmail);
        }
        if !is_valid_phone(&self.mobile) {
            return Err(StepError::InvalidPhone);
        }
        Ok(())
    }
}

fn require(missing: &mut Vec<&'static str>, label: &'static str, value: &str) {
    if value.is_empty() {
        missing.push(label);
    }
}

/// Flattened view of an application as relayed to the webhook. `step` is
/// present for incomplete applications only.
#[derive(Clone, Debug)]
pub struct ApplicationReport {
    pub step: Option<Step>,
    pub form: ApplicationForm,
    pub photo_url: Option<String>,
}

impl ApplicationReport {
    pub fn into_pairs(self) -> Vec<(String, String)> {
        let form = self.form;
        let mut pairs = Vec::new();
        if let Some(step) = self.step {
            pairs.push(("current_step".to_string(), step.number().to_string()));
        }
        let direct_debit = match form.direct_debit {
            DirectDebit::Authorized => "yes",
            DirectDebit::Manual => "no",
        };
        let fields = [
            ("first_name", form.first_name),
            ("last_name", form.last_name),
            ("birth_date", form.birth_date),
            ("email", form.email),
            ("mobile", form.mobile),
            ("country", form.country),
            ("postcode", form.postcode),
            ("house_number", form.house_number),
            ("street", form.street),
            ("city", form.city),
            (
                "photo",
                form.photo.map(|p| p.file_name).unwrap_or_default(),
            ),
            ("direct_debit", direct_debit.to_string()),
            ("iban", form.iban),
            ("account_holder", form.account_holder),
            ("mother_phone", form.mother_phone),
            ("father_phone", form.father_phone),
            ("emergency_number", form.emergency_number),
            ("membership_type", form.membership_type),
            ("minor_consent", form.minor_consent.to_string()),
            ("signature", form.signature),
        ];
        pairs.extend(
            fields
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        );
        if let Some(url) = self.photo_url {
            pairs.push(("photo_url".to_string(), url));
        }
        pairs
    }
}
