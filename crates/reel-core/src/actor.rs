//! The party performing an operation.
//!
//! Identity is always passed explicitly; nothing in this crate reads it from
//! ambient request state.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Which side of the marketplace an actor belongs to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  Influencer,
  Brand,
}

/// An authenticated caller: a brand id or an influencer id, tagged with the
/// role it acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id:   i64,
  pub role: Role,
}

impl Actor {
  pub fn influencer(id: i64) -> Self { Self { id, role: Role::Influencer } }

  pub fn brand(id: i64) -> Self { Self { id, role: Role::Brand } }

  pub fn is_brand(&self) -> bool { self.role == Role::Brand }
}
