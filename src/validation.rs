//! Submission validation.
//!
//! Every check runs; failures are collected and shown together rather than
//! short-circuiting, so the visitor can fix everything in one pass.

use crate::rate_limit::CooldownError;

/// A user-visible reason a submission was refused. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Honeypot field was filled in.
    Spam,
    /// CSRF token missing, unknown to the session, or mismatched.
    InvalidToken,
    /// Name empty or over the character limit.
    Name { max: usize },
    /// Message empty or over the character limit.
    Message { max: usize },
    /// Cooldown since the submitter's last accepted post has not elapsed.
    Throttled { retry_after_seconds: u64 },
    /// Persisting the entry failed; the visitor may simply retry.
    Storage { data_dir: String },
}

impl Violation {
    /// User-facing message shown in the error banner.
    pub fn message(&self) -> String {
        match self {
            Violation::Spam => "Suspected spam – the form was not accepted.".to_string(),
            Violation::InvalidToken => {
                "Security token invalid. Please submit the form again.".to_string()
            }
            Violation::Name { max } => {
                format!("Please provide a name (max. {} characters).", max)
            }
            Violation::Message { max } => {
                format!("Please enter a message (max. {} characters).", max)
            }
            Violation::Throttled {
                retry_after_seconds,
            } => format!(
                "Please wait {} second(s) before posting again.",
                retry_after_seconds
            ),
            Violation::Storage { data_dir } => format!(
                "Saving failed. Check write permissions for {}.",
                data_dir
            ),
        }
    }
}

/// Field limits the validator enforces, injected from configuration.
#[derive(Debug, Clone, Copy)]
pub struct FieldLimits {
    pub max_name_len: usize,
    pub max_message_len: usize,
}

/// A trimmed submission plus everything derived before validation runs.
pub struct SubmissionCheck<'a> {
    pub name: &'a str,
    pub message: &'a str,
    pub honeypot: &'a str,
    pub csrf_valid: bool,
    pub cooldown: Result<(), CooldownError>,
}

/// Run all checks in order. An empty result means the submission is
/// accepted.
///
/// Lengths count Unicode characters, not bytes, so multi-byte text is not
/// unfairly rejected.
pub fn validate(check: &SubmissionCheck, limits: &FieldLimits) -> Vec<Violation> {
    let mut violations = Vec::new();

    if !check.honeypot.is_empty() {
        violations.push(Violation::Spam);
    }
    if !check.csrf_valid {
        violations.push(Violation::InvalidToken);
    }
    if check.name.is_empty() || check.name.chars().count() > limits.max_name_len {
        violations.push(Violation::Name {
            max: limits.max_name_len,
        });
    }
    if check.message.is_empty() || check.message.chars().count() > limits.max_message_len {
        violations.push(Violation::Message {
            max: limits.max_message_len,
        });
    }
    if let Err(cooldown) = &check.cooldown {
        violations.push(Violation::Throttled {
            retry_after_seconds: cooldown.retry_after_seconds,
        });
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: FieldLimits = FieldLimits {
        max_name_len: 50,
        max_message_len: 2000,
    };

    fn valid_check<'a>(name: &'a str, message: &'a str) -> SubmissionCheck<'a> {
        SubmissionCheck {
            name,
            message,
            honeypot: "",
            csrf_valid: true,
            cooldown: Ok(()),
        }
    }

    #[test]
    fn test_valid_submission_has_no_violations() {
        assert!(validate(&valid_check("Ada", "Hello\nWorld"), &LIMITS).is_empty());
    }

    #[test]
    fn test_honeypot_rejects_regardless_of_other_fields() {
        let check = SubmissionCheck {
            honeypot: "https://spam.example",
            ..valid_check("Ada", "Hello")
        };
        assert!(validate(&check, &LIMITS).contains(&Violation::Spam));
    }

    #[test]
    fn test_invalid_csrf_is_a_violation() {
        let check = SubmissionCheck {
            csrf_valid: false,
            ..valid_check("Ada", "Hello")
        };
        assert_eq!(validate(&check, &LIMITS), vec![Violation::InvalidToken]);
    }

    #[test]
    fn test_name_boundary_at_limit() {
        // Multi-byte characters count as one each.
        let exactly_50: String = "ü".repeat(50);
        assert!(validate(&valid_check(&exactly_50, "Hello"), &LIMITS).is_empty());

        let over_51: String = "ü".repeat(51);
        assert_eq!(
            validate(&valid_check(&over_51, "Hello"), &LIMITS),
            vec![Violation::Name { max: 50 }]
        );
    }

    #[test]
    fn test_message_boundary_at_limit() {
        let exactly_2000: String = "語".repeat(2000);
        assert!(validate(&valid_check("Ada", &exactly_2000), &LIMITS).is_empty());

        let over_2001: String = "語".repeat(2001);
        assert_eq!(
            validate(&valid_check("Ada", &over_2001), &LIMITS),
            vec![Violation::Message { max: 2000 }]
        );
    }

    #[test]
    fn test_empty_fields_are_violations() {
        let violations = validate(&valid_check("", ""), &LIMITS);
        assert_eq!(
            violations,
            vec![
                Violation::Name { max: 50 },
                Violation::Message { max: 2000 }
            ]
        );
    }

    #[test]
    fn test_cooldown_violation_carries_remaining_wait() {
        let check = SubmissionCheck {
            cooldown: Err(crate::rate_limit::CooldownError {
                retry_after_seconds: 12,
            }),
            ..valid_check("Ada", "Hello")
        };
        let violations = validate(&check, &LIMITS);
        assert_eq!(
            violations,
            vec![Violation::Throttled {
                retry_after_seconds: 12
            }]
        );
        assert!(violations[0].message().contains("12"));
    }

    #[test]
    fn test_all_failures_are_collected() {
        let check = SubmissionCheck {
            name: "",
            message: "",
            honeypot: "bot",
            csrf_valid: false,
            cooldown: Err(crate::rate_limit::CooldownError {
                retry_after_seconds: 5,
            }),
        };
        assert_eq!(validate(&check, &LIMITS).len(), 5);
    }
}
