use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use super::order::Order;

/// Firm value carried by users who see every firm.
pub const ALL_FIRMS: &str = "ALL";

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Master,
    Admin,
    User,
}

/// Static credential record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub password: String,
    pub role: Role,
    pub firm: String,
    pub name: String,
}

/// The acting user attached to a session; never carries the password.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
    pub role: Role,
    pub firm: String,
    pub name: String,
}

impl SessionUser {
    pub fn is_master(&self) -> bool {
        self.role == Role::Master
    }

    /// Master sees every firm; everyone else only their own.
    pub fn can_view_firm(&self, firm: &str) -> bool {
        self.is_master() || self.firm.eq_ignore_ascii_case(firm)
    }

    pub fn can_view(&self, order: &Order) -> bool {
        self.can_view_firm(&order.firm_name)
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
            firm: user.firm.clone(),
            name: user.name.clone(),
        }
    }
}
