use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable identifier of a registered user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Identifier of a match record (pending or mutual)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical key of an unordered user pair
///
/// `low` is always the smaller id. Two users map to the same key no matter
/// which one acted first, which is what storage and lookups key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    pub low: UserId,
    pub high: UserId,
}

impl PairKey {
    /// Returns `None` for a pair of identical users.
    pub fn new(a: UserId, b: UserId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Humour category a user identifies with or looks for
///
/// Tags are compared after trimming and lowercasing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HumourTag(String);

impl HumourTag {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for HumourTag {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<HumourTag> for String {
    fn from(value: HumourTag) -> Self {
        value.0
    }
}

/// Profile attributes shown to other users
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub humour_tags: BTreeSet<HumourTag>,
}

/// What a user is looking for in the feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub gender: Option<String>,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    #[serde(default)]
    pub humour_tags: BTreeSet<HumourTag>,
}

impl Preferences {
    /// Gender preference, ignoring blank values
    pub fn gender(&self) -> Option<&str> {
        non_blank(&self.gender)
    }

    /// Inclusive age range, only when both bounds are set
    pub fn age_range(&self) -> Option<(i32, i32)> {
        match (self.age_min, self.age_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

impl Profile {
    pub fn gender(&self) -> Option<&str> {
        non_blank(&self.gender)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Registered user with profile and preference attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub email: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub preferences: Preferences,
}

/// Data needed to register a user record
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

/// Everything a user edits on their own profile page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDetails {
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub profile: Profile,
}

/// State of a relationship between two users
///
/// `Pending` records a one-way like from `from` to `to`. `Matched` keeps the
/// original liker in `first`; slots are fixed at creation and never swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MatchState {
    Pending { from: UserId, to: UserId },
    Matched { first: UserId, second: UserId },
}

/// Persisted match record for an unordered user pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    #[serde(flatten)]
    pub state: MatchState,
    pub created_at: DateTime<Utc>,
    pub matched_at: Option<DateTime<Utc>>,
}

impl Match {
    /// User stored in the first slot (the original liker)
    pub fn user1(&self) -> UserId {
        match self.state {
            MatchState::Pending { from, .. } => from,
            MatchState::Matched { first, .. } => first,
        }
    }

    pub fn user2(&self) -> UserId {
        match self.state {
            MatchState::Pending { to, .. } => to,
            MatchState::Matched { second, .. } => second,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self.state, MatchState::Matched { .. })
    }

    pub fn pair(&self) -> PairKey {
        // slots are distinct by construction
        PairKey {
            low: self.user1().min(self.user2()),
            high: self.user1().max(self.user2()),
        }
    }

    pub fn involves(&self, user: UserId) -> bool {
        self.user1() == user || self.user2() == user
    }

    /// The other participant, if `user` is one of them
    pub fn partner_of(&self, user: UserId) -> Option<UserId> {
        if self.user1() == user {
            Some(self.user2())
        } else if self.user2() == user {
            Some(self.user1())
        } else {
            None
        }
    }
}

/// What a like did to the pair's match record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeOutcome {
    /// First like between the two users, recorded as one-way
    Pending,
    /// Reciprocal like; the pair is now mutually matched
    Matched,
    /// The pair was already matched, nothing changed
    AlreadyMatched,
    /// The liker had already liked this user, nothing changed
    AlreadyLiked,
}

impl LikeOutcome {
    /// True when the like changed the stored record
    pub fn changed_state(&self) -> bool {
        matches!(self, LikeOutcome::Pending | LikeOutcome::Matched)
    }
}

/// Chat message exchanged inside a mutual match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub match_id: MatchId,
    pub sender_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Data needed to store a message; the store assigns id and timestamp
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub match_id: MatchId,
    pub sender_id: UserId,
    pub content: String,
}
