//! Structural and semantic request validation.
//!
//! Every check runs before any write. Violations are collected rather than
//! short-circuited so a caller can fix everything in one round trip; only
//! the caller-identity check fails on its own, as an authorization error.

use common::SupplierId;

use crate::error::{BundleError, Violation};
use crate::request::{BundleRequest, LeadRef, ProjectRef};

/// A request that passed validation.
///
/// Only constructible through [`validate`], so downstream components can
/// rely on the checks having run.
#[derive(Debug, Clone)]
pub struct ValidatedRequest(BundleRequest);

impl ValidatedRequest {
    /// Returns the validated request.
    pub fn inner(&self) -> &BundleRequest {
        &self.0
    }

    /// Consumes the wrapper.
    pub fn into_inner(self) -> BundleRequest {
        self.0
    }
}

/// Validates `request` on behalf of `caller`.
///
/// The caller's identity must equal the declared supplier id; everything
/// else is collected into a single `ValidationError`.
pub fn validate(
    caller: SupplierId,
    request: BundleRequest,
) -> Result<ValidatedRequest, BundleError> {
    if caller != request.supplier_id {
        return Err(BundleError::Authorization(format!(
            "caller {caller} does not match declared supplier {}",
            request.supplier_id
        )));
    }

    let mut violations = Vec::new();

    match &request.lead {
        LeadRef::Create { new } if new.full_name.trim().is_empty() => {
            violations.push(Violation::new("lead.new.full_name", "must not be empty"));
        }
        _ => {}
    }

    match &request.project {
        ProjectRef::Create { new } if new.title.trim().is_empty() => {
            violations.push(Violation::new("project.new.title", "must not be empty"));
        }
        _ => {}
    }

    if request.order.title.trim().is_empty() {
        violations.push(Violation::new("order.title", "must not be empty"));
    }

    if request.order.items.is_empty() {
        violations.push(Violation::new("order.items", "must not be empty"));
    }
    for (index, item) in request.order.items.iter().enumerate() {
        if item.name.trim().is_empty() {
            violations.push(Violation::for_item(index, "name", "must not be empty"));
        }
        if item.qty == 0 {
            violations.push(Violation::for_item(index, "qty", "must be greater than zero"));
        }
        if item.unit_price_cents < 0 {
            violations.push(Violation::for_item(
                index,
                "unit_price_cents",
                "must not be negative",
            ));
        }
    }

    if let (Some(start), Some(end)) = (request.order.start_date, request.order.end_date)
        && end < start
    {
        violations.push(Violation::new(
            "order.end_date",
            "must not be before start_date",
        ));
    }

    if violations.is_empty() {
        Ok(ValidatedRequest(request))
    } else {
        Err(BundleError::Validation(violations))
    }
}
