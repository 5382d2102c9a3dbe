//! Patent claim dependency checking.
//!
//! Runs only when the domain is patent and the request carries claims. The
//! numbering rule (a dependent claim may only reference a strictly earlier
//! claim) makes cycles impossible, but referenced numbers are still checked
//! against the `1..=N` range.

use super::domain::{Claim, ClaimType};
use super::validation::Violation;

pub const CLAIM_TEXT_MIN: usize = 10;
pub const CLAIM_TEXT_MAX: usize = 5_000;

/// Validate the full ordered claim sequence, collecting every violation.
pub fn validate_claims(claims: &[Claim]) -> Vec<Violation> {
    let mut violations = Vec::new();

    if claims.is_empty() {
        violations.push(Violation::new(
            "claims",
            "required",
            "at least one claim is required",
        ));
        return violations;
    }

    let total = claims.len() as u32;

    for (index, claim) in claims.iter().enumerate() {
        let expected = index as u32 + 1;
        let field = format!("claims[{}]", claim.claim_number);

        if claim.claim_number != expected {
            violations.push(Violation::new(
                field.clone(),
                "sequence",
                format!(
                    "claim at position {expected} is numbered {}",
                    claim.claim_number
                ),
            ));
        }

        let length = claim.claim_text.trim().chars().count();
        if length < CLAIM_TEXT_MIN {
            violations.push(Violation::new(
                field.clone(),
                "min_length",
                format!(
                    "claim {} text must be at least {CLAIM_TEXT_MIN} characters",
                    claim.claim_number
                ),
            ));
        } else if length > CLAIM_TEXT_MAX {
            violations.push(Violation::new(
                field.clone(),
                "max_length",
                format!(
                    "claim {} text must be at most {CLAIM_TEXT_MAX} characters",
                    claim.claim_number
                ),
            ));
        }

        match (claim.claim_type, claim.depends_on) {
            (ClaimType::Independent, Some(target)) => {
                violations.push(Violation::new(
                    field,
                    "dependency",
                    format!(
                        "independent claim {} must not reference claim {target}",
                        claim.claim_number
                    ),
                ));
            }
            (ClaimType::Independent, None) => {}
            (ClaimType::Dependent, None) => {
                violations.push(Violation::new(
                    field,
                    "dependency",
                    format!(
                        "dependent claim {} must name the claim it depends on",
                        claim.claim_number
                    ),
                ));
            }
            (ClaimType::Dependent, Some(target)) => {
                if target == 0 || target > total {
                    violations.push(Violation::new(
                        field,
                        "dependency",
                        format!(
                            "claim {} depends on claim {target}, which does not exist",
                            claim.claim_number
                        ),
                    ));
                } else if target >= claim.claim_number {
                    violations.push(Violation::new(
                        field,
                        "dependency",
                        format!(
                            "claim {} must depend on an earlier claim, not claim {target}",
                            claim.claim_number
                        ),
                    ));
                }
            }
        }
    }

    violations
}
