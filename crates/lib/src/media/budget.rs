//! Per-cabinet size budget.

use std::env;
use std::num::IntErrorKind;

use tracing::debug;

use crate::consts::{DEFAULT_MAX_UNCOMPRESSED_MEDIA_SIZE_MB, MEDIA_SIZE_OVERRIDE_VAR};

use super::MediaError;

const BYTES_PER_MB: i64 = 1024 * 1024;

/// Parse a megabyte override. Empty or absent means no override.
pub fn parse_override(value: Option<&str>) -> Result<Option<i64>, MediaError> {
  let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
    return Ok(None);
  };

  let invalid = || MediaError::InvalidOverride {
    variable: MEDIA_SIZE_OVERRIDE_VAR.to_string(),
    value: raw.to_string(),
  };

  match raw.parse::<i64>() {
    Ok(mb) if mb > 0 => Ok(Some(mb)),
    Ok(_) => Err(invalid()),
    Err(e) if *e.kind() == IntErrorKind::PosOverflow => Err(MediaError::BudgetTooLarge {
      megabytes: raw.to_string(),
    }),
    Err(_) => Err(invalid()),
  }
}

/// Read the override from `MSIBIND_MUMS`.
pub fn override_from_env() -> Result<Option<i64>, MediaError> {
  match env::var(MEDIA_SIZE_OVERRIDE_VAR) {
    Ok(value) => parse_override(Some(&value)),
    Err(env::VarError::NotPresent) => Ok(None),
    Err(env::VarError::NotUnicode(value)) => Err(MediaError::InvalidOverride {
      variable: MEDIA_SIZE_OVERRIDE_VAR.to_string(),
      value: value.to_string_lossy().into_owned(),
    }),
  }
}

/// `megabytes` expressed in bytes.
pub fn budget_bytes(megabytes: i64) -> Result<u64, MediaError> {
  let too_large = || MediaError::BudgetTooLarge {
    megabytes: megabytes.to_string(),
  };
  let bytes = megabytes.checked_mul(BYTES_PER_MB).ok_or_else(too_large)?;
  u64::try_from(bytes).map_err(|_| MediaError::InvalidOverride {
    variable: MEDIA_SIZE_OVERRIDE_VAR.to_string(),
    value: megabytes.to_string(),
  })
}

/// Budget in bytes: the override wins over the authored template value,
/// which wins over the default.
pub fn resolve_budget(override_mb: Option<i64>, authored_mb: Option<i64>) -> Result<u64, MediaError> {
  let megabytes = override_mb
    .or(authored_mb)
    .unwrap_or(DEFAULT_MAX_UNCOMPRESSED_MEDIA_SIZE_MB);
  debug!(
    megabytes,
    overridden = override_mb.is_some(),
    "maximum uncompressed media size"
  );
  budget_bytes(megabytes)
}
