//! Office practice services: the client registry, the case desk, the
//! accounting book, and document drafting. Each service owns a handle to the
//! record store and applies role scoping at the data boundary, before any
//! record leaves the service.

pub mod cases;
pub mod clients;
pub mod docgen;
pub mod ledger;

use crate::audit;
use crate::error::OfficeError;
use crate::identity::Role;

/// Administrator and staff may perform office actions; everyone else is
/// refused and the refusal is counted.
pub(crate) fn require_office(viewer: &Role, action: &'static str) -> Result<(), OfficeError> {
    if viewer.is_office() {
        return Ok(());
    }
    audit::inc_blocked_action();
    Err(OfficeError::Forbidden {
        role: viewer.kind().as_str(),
        action,
    })
}

/// Administrator only. Staff hit this boundary too, so the refusal names the
/// role that was turned away.
pub(crate) fn require_administrator(
    viewer: &Role,
    action: &'static str,
) -> Result<(), OfficeError> {
    if matches!(viewer, Role::Administrator) {
        return Ok(());
    }
    audit::inc_blocked_action();
    Err(OfficeError::Forbidden {
        role: viewer.kind().as_str(),
        action,
    })
}
