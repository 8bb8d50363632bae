//! Metric values attached to an entry.
//!
//! Each media kind declares a closed set of metric keys. Raw JSON arriving at
//! the boundary is coerced into [`Metrics`] by [`Metrics::parse`]; unknown
//! keys are rejected rather than stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, entry::MediaKind};

// ─── Keys ────────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Display,
  EnumString,
  AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum MetricKey {
  Impressions,
  Reach,
  Likes,
  Comments,
  Shares,
  Saves,
  ProfileVisits,
  Plays,
  Views,
  WatchTimeSeconds,
  Replies,
  Exits,
  TapsForward,
  TapsBack,
  LinkClicks,
}

impl MediaKind {
  /// The metric keys an entry of this kind may carry.
  pub fn allowed_metrics(self) -> &'static [MetricKey] {
    use MetricKey::*;
    match self {
      Self::Post => &[
        Impressions,
        Reach,
        Likes,
        Comments,
        Shares,
        Saves,
        ProfileVisits,
      ],
      Self::Reel => {
        &[Plays, Reach, Likes, Comments, Shares, Saves, WatchTimeSeconds]
      }
      Self::Story => &[
        Impressions,
        Reach,
        Replies,
        Exits,
        TapsForward,
        TapsBack,
        LinkClicks,
      ],
      Self::Video => &[Views, Reach, Likes, Comments, Shares, WatchTimeSeconds],
    }
  }
}

// ─── Metrics ─────────────────────────────────────────────────────────────────

/// A validated set of metric counts. Serialises as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
  try_from = "BTreeMap<String, u64>",
  into = "BTreeMap<String, u64>"
)]
pub struct Metrics(BTreeMap<MetricKey, u64>);

impl Metrics {
  pub fn new() -> Self { Self::default() }

  /// Coerce an open JSON map into metrics for `kind`.
  ///
  /// Integral numbers and numeric strings are accepted. Unknown keys, keys
  /// not declared for `kind`, and negative, fractional, or non-numeric values
  /// are rejected.
  pub fn parse(
    kind: MediaKind,
    raw: &serde_json::Map<String, serde_json::Value>,
  ) -> Result<Self> {
    let mut out = BTreeMap::new();
    for (name, value) in raw {
      let key: MetricKey = name
        .parse()
        .map_err(|_| Error::validation(format!("unknown metric {name:?}")))?;
      if !kind.allowed_metrics().contains(&key) {
        return Err(Error::validation(format!(
          "metric {name:?} is not recorded for {kind} entries"
        )));
      }
      out.insert(key, coerce(name, value)?);
    }
    Ok(Self(out))
  }

  /// Check that every key present is declared for `kind`.
  pub fn check_kind(&self, kind: MediaKind) -> Result<()> {
    let allowed = kind.allowed_metrics();
    match self.0.keys().find(|k| !allowed.contains(k)) {
      Some(k) => Err(Error::validation(format!(
        "metric {:?} is not recorded for {kind} entries",
        k.as_ref()
      ))),
      None => Ok(()),
    }
  }

  pub fn with(mut self, key: MetricKey, value: u64) -> Self {
    self.0.insert(key, value);
    self
  }

  pub fn get(&self, key: MetricKey) -> Option<u64> { self.0.get(&key).copied() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn iter(&self) -> impl Iterator<Item = (MetricKey, u64)> + '_ {
    self.0.iter().map(|(k, v)| (*k, *v))
  }
}

fn coerce(name: &str, value: &serde_json::Value) -> Result<u64> {
  use serde_json::Value;

  let coerced = match value {
    Value::Number(n) => n.as_u64().or_else(|| {
      n.as_f64()
        .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
        .map(|f| f as u64)
    }),
    Value::String(s) => s.trim().parse::<u64>().ok(),
    _ => None,
  };

  coerced.ok_or_else(|| {
    Error::validation(format!("metric {name:?} must be a non-negative integer"))
  })
}

impl TryFrom<BTreeMap<String, u64>> for Metrics {
  type Error = String;

  fn try_from(raw: BTreeMap<String, u64>) -> std::result::Result<Self, String> {
    raw
      .into_iter()
      .map(|(name, v)| {
        name
          .parse::<MetricKey>()
          .map(|k| (k, v))
          .map_err(|_| format!("unknown metric {name:?}"))
      })
      .collect::<std::result::Result<_, _>>()
      .map(Self)
  }
}

impl From<Metrics> for BTreeMap<String, u64> {
  fn from(m: Metrics) -> Self {
    m.0.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
  }
}
