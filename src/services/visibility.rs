//! Role/firm filtering applied to every read and every write lookup.

use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Order, SessionUser};

pub fn visible<'a>(
    actor: &'a SessionUser,
    orders: &'a [Order],
) -> impl Iterator<Item = &'a Order> + 'a {
    orders.iter().filter(move |order| actor.can_view(order))
}

/// Index of order `id`, treating orders the actor cannot see as missing.
pub fn position_visible(
    actor: &SessionUser,
    orders: &[Order],
    id: Uuid,
) -> Result<usize, ServiceError> {
    orders
        .iter()
        .position(|order| order.id == id && actor.can_view(order))
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))
}

/// Firm a new order is filed under.
///
/// Non-master actors always file under their own firm; a master must name one.
pub fn creation_firm(
    actor: &SessionUser,
    requested: Option<&str>,
) -> Result<String, ServiceError> {
    let requested = requested
        .map(|firm| firm.trim().to_uppercase())
        .filter(|firm| !firm.is_empty());

    if actor.is_master() {
        return requested.ok_or_else(|| {
            ServiceError::ValidationError("firmName is required when creating as master".into())
        });
    }

    let own = actor.firm.trim().to_uppercase();
    match requested {
        Some(firm) if firm != own => Err(ServiceError::Forbidden(format!(
            "cannot create orders for firm {}",
            firm
        ))),
        _ => Ok(own),
    }
}
