//! Form drafts
//!
//! Each form screen owns one draft. Drafts live only as long as their screen
//! visit and are never persisted.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use job_board_types::{ApplicationDraft, Credentials, JobPostingDraft, Registration};
use regex::Regex;
use thiserror::Error;

use super::ScreenState;
use crate::error::ValidationError;

pub type LoginDraft = Credentials;
pub type RegisterDraft = Registration;

/// Draft of the active screen; `None` on screens without a form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormDraft {
    #[default]
    None,
    PostJob(JobPostingDraft),
    Apply(ApplicationDraft),
    Login(LoginDraft),
    Register(RegisterDraft),
}

/// Form input, addressed by its wire name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Title,
    Company,
    Location,
    Description,
    ApplicantName,
    ApplicantEmail,
    Resume,
    Username,
    Email,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown form field '{0}'")]
pub struct UnknownField(pub String);

impl FormField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Company => "company",
            Self::Location => "location",
            Self::Description => "description",
            Self::ApplicantName => "applicant_name",
            Self::ApplicantEmail => "applicant_email",
            Self::Resume => "resume",
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
        }
    }

    /// Masked when echoed back
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Password)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "title" => Ok(Self::Title),
            "company" => Ok(Self::Company),
            "location" => Ok(Self::Location),
            "description" => Ok(Self::Description),
            "applicant_name" => Ok(Self::ApplicantName),
            "applicant_email" => Ok(Self::ApplicantEmail),
            "resume" => Ok(Self::Resume),
            "username" => Ok(Self::Username),
            "email" => Ok(Self::Email),
            "password" => Ok(Self::Password),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

impl FormDraft {
    /// Fresh, empty draft for `screen`
    pub fn for_screen(screen: ScreenState) -> Self {
        match screen {
            ScreenState::Jobs => Self::None,
            ScreenState::PostJob => Self::PostJob(JobPostingDraft::default()),
            ScreenState::Apply(_) => Self::Apply(ApplicationDraft::default()),
            ScreenState::Login => Self::Login(LoginDraft::default()),
            ScreenState::Register => Self::Register(RegisterDraft::default()),
        }
    }

    /// Fields of this form, in display order
    pub fn fields(&self) -> &'static [FormField] {
        use FormField::*;
        match self {
            Self::None => &[],
            Self::PostJob(_) => &[Title, Company, Location, Description],
            Self::Apply(_) => &[ApplicantName, ApplicantEmail, Resume],
            Self::Login(_) => &[Username, Password],
            Self::Register(_) => &[Username, Email, Password],
        }
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.slot(field).map(String::as_str)
    }

    /// Overwrite one field. Returns false when this form has no such field.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) -> bool {
        match self.slot_mut(field) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Local checks run before any request: required fields, then email shape.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let (missing, email) = match self {
            Self::None => return Ok(()),
            Self::PostJob(d) => (d.missing_fields(), None),
            Self::Apply(d) => (d.missing_fields(), Some(&d.applicant_email)),
            Self::Login(d) => (d.missing_fields(), None),
            Self::Register(d) => (d.missing_fields(), Some(&d.email)),
        };

        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        match email {
            Some(email) if !looks_like_email(email) => {
                Err(ValidationError::InvalidEmail(email.trim().to_string()))
            }
            _ => Ok(()),
        }
    }

    fn slot(&self, field: FormField) -> Option<&String> {
        use FormField as F;
        match (self, field) {
            (Self::PostJob(d), F::Title) => Some(&d.title),
            (Self::PostJob(d), F::Company) => Some(&d.company),
            (Self::PostJob(d), F::Location) => Some(&d.location),
            (Self::PostJob(d), F::Description) => Some(&d.description),
            (Self::Apply(d), F::ApplicantName) => Some(&d.applicant_name),
            (Self::Apply(d), F::ApplicantEmail) => Some(&d.applicant_email),
            (Self::Apply(d), F::Resume) => Some(&d.resume),
            (Self::Login(d), F::Username) => Some(&d.username),
            (Self::Login(d), F::Password) => Some(&d.password),
            (Self::Register(d), F::Username) => Some(&d.username),
            (Self::Register(d), F::Email) => Some(&d.email),
            (Self::Register(d), F::Password) => Some(&d.password),
            _ => None,
        }
    }

    fn slot_mut(&mut self, field: FormField) -> Option<&mut String> {
        use FormField as F;
        match (self, field) {
            (Self::PostJob(d), F::Title) => Some(&mut d.title),
            (Self::PostJob(d), F::Company) => Some(&mut d.company),
            (Self::PostJob(d), F::Location) => Some(&mut d.location),
            (Self::PostJob(d), F::Description) => Some(&mut d.description),
            (Self::Apply(d), F::ApplicantName) => Some(&mut d.applicant_name),
            (Self::Apply(d), F::ApplicantEmail) => Some(&mut d.applicant_email),
            (Self::Apply(d), F::Resume) => Some(&mut d.resume),
            (Self::Login(d), F::Username) => Some(&mut d.username),
            (Self::Login(d), F::Password) => Some(&mut d.password),
            (Self::Register(d), F::Username) => Some(&mut d.username),
            (Self::Register(d), F::Email) => Some(&mut d.email),
            (Self::Register(d), F::Password) => Some(&mut d.password),
            _ => None,
        }
    }
}

/// The `input type="email"` rule: dot-atom style local part, domain of
/// hyphenated labels of at most 63 characters.
static EMAIL: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
});

/// Email shape check on the trimmed value
pub fn looks_like_email(value: &str) -> bool {
    match EMAIL.as_ref() {
        Ok(re) => re.is_match(value.trim()),
        Err(e) => {
            tracing::error!(error = %e, "email pattern failed to compile");
            false
        }
    }
}
