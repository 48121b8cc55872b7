//! Per-operation capability checks.
//!
//! Each Router entry point names the role it needs by calling one of these
//! directly, so the authorization rule for an operation reads in one place.

use equorum_types::Address;

use crate::{Result, RouterError};

/// Only the owner.
pub fn require_owner(caller: Address, owner: Address) -> Result<()> {
    if caller != owner {
        return Err(RouterError::Unauthorized { caller });
    }
    Ok(())
}

/// The owner or the protocol payout address.
pub fn require_owner_or_protocol(caller: Address, owner: Address, protocol: Address) -> Result<()> {
    if caller != owner && caller != protocol {
        return Err(RouterError::Unauthorized { caller });
    }
    Ok(())
}

/// Reject the zero address.
pub fn require_nonzero(address: Address) -> Result<()> {
    if address.is_zero() {
        return Err(RouterError::InvalidAddress);
    }
    Ok(())
}
