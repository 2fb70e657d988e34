//! Translation of provider-native codes into gateway result codes.

use std::collections::HashMap;

use super::payment::RawCode;
use super::result_code::ResultCode;

/// Immutable lookup table from raw provider codes to result codes.
///
/// Codes missing from the table map to [`ResultCode::FORMAT_ERROR`].
///
/// # Examples
/// ```
/// use payment_gateway::domain::{CodeMapper, RawCode, ResultCode};
///
/// let mapper = CodeMapper::simulator();
/// assert_eq!(mapper.map(RawCode::new(99)), ResultCode::ACCOUNT_NOT_FOUND);
/// assert_eq!(mapper.map(RawCode::new(42)), ResultCode::FORMAT_ERROR);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMapper {
    table: HashMap<RawCode, ResultCode>,
}

impl CodeMapper {
    /// Build a mapper from `(raw, result)` pairs. Later pairs win.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i32, i32)>) -> Self {
        let table = pairs
            .into_iter()
            .map(|(raw, result)| (RawCode::new(raw), ResultCode::new(result)))
            .collect();
        Self { table }
    }

    /// Table used by the simulated provider.
    #[must_use]
    pub fn simulator() -> Self {
        Self::from_pairs([
            (2, ResultCode::SUCCESS.value()),
            (3, ResultCode::PROVIDER_TIMEOUT.value()),
            (1, 300),
            (99, ResultCode::ACCOUNT_NOT_FOUND.value()),
        ])
    }

    /// Map a raw code.
    #[must_use]
    pub fn map(&self, raw: RawCode) -> ResultCode {
        self.table
            .get(&raw)
            .copied()
            .unwrap_or(ResultCode::FORMAT_ERROR)
    }
}
