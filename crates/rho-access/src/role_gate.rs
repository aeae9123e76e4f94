//! Role-gate evaluation for inbound commands and button interactions.

/// Outcome of a role-gate check, with a machine-readable reason code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow { reason_code: &'static str },
    Deny { reason_code: &'static str },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow { .. })
    }

    pub fn reason_code(&self) -> &'static str {
        match self {
            AccessDecision::Allow { reason_code } => reason_code,
            AccessDecision::Deny { reason_code } => reason_code,
        }
    }
}

/// Evaluates whether a principal holding `principal_role_ids` may act.
///
/// An absent or blank `required_role_id` means the gate is open and every
/// principal is authorized. Otherwise the principal must hold the configured
/// role; membership is whatever the caller resolved at call time.
pub fn evaluate_role_gate(
    required_role_id: Option<&str>,
    principal_role_ids: &[String],
) -> AccessDecision {
    let Some(required) = required_role_id.map(str::trim).filter(|id| !id.is_empty()) else {
        return AccessDecision::Allow {
            reason_code: "open_gate",
        };
    };

    if principal_role_ids.iter().any(|role| role == required) {
        AccessDecision::Allow {
            reason_code: "role_match",
        }
    } else {
        AccessDecision::Deny {
            reason_code: "missing_role",
        }
    }
}
