use std::fmt;

/// Entity kinds subject to creation quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaKind {
    Set,
    Card,
    Collection,
}

impl QuotaKind {
    pub const ALL: [QuotaKind; 3] = [QuotaKind::Set, QuotaKind::Card, QuotaKind::Collection];

    /// User-facing singular name.
    pub fn as_str(self) -> &'static str {
        match self {
            QuotaKind::Set => "set",
            QuotaKind::Card => "flashcard",
            QuotaKind::Collection => "collection",
        }
    }

    /// Counter column in `quota_ledgers`.
    pub(crate) fn ledger_column(self) -> &'static str {
        match self {
            QuotaKind::Set => "sets_created",
            QuotaKind::Card => "cards_created",
            QuotaKind::Collection => "collections_created",
        }
    }

    /// Hash field in the Redis ledger.
    pub(crate) fn redis_field(self) -> &'static str {
        match self {
            QuotaKind::Set => "sets",
            QuotaKind::Card => "cards",
            QuotaKind::Collection => "collections",
        }
    }
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
