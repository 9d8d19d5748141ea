//! A social-graph entity composed of two LWW sets.
//!
//! [`Friendship`] shows how an application composes CRDTs: each replicated
//! field is merged independently while the non-replicated `user_key` must
//! be identical on both sides. Using an entity without a key, or merging two
//! different users, is a [`CrdtError::PreconditionViolation`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::lww_set::LWWSetPayload;
use crate::replica::{Clock, SystemClock};
use crate::{Crdt, CrdtError, LWWSet, Result, SetCrdt};

/// Persisted form of a [`Friendship`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendshipPayload {
    /// Owner of the relationships. Constant across replicas.
    pub user_key: String,
    /// Users this user follows.
    pub following: LWWSetPayload<String>,
    /// Users following this user.
    pub followers: LWWSetPayload<String>,
}

/// Derived view of a [`Friendship`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendshipValue {
    /// Owner of the relationships.
    pub user_key: String,
    /// Users this user follows.
    pub following: BTreeSet<String>,
    /// Users following this user.
    pub followers: BTreeSet<String>,
}

/// Who a user follows and who follows them.
///
/// # Example
///
/// ```
/// use crdt_toolbox::friendship::Friendship;
///
/// let mut eric = Friendship::new("eric");
/// let mut glenn = Friendship::new("glenn");
/// eric.follow(&mut glenn).unwrap();
///
/// assert!(eric.is_following("glenn"));
/// assert!(glenn.is_followed_by("eric"));
/// ```
#[derive(Debug, Clone)]
pub struct Friendship<C: Clock + Clone = SystemClock> {
    user_key: Option<String>,
    following: LWWSet<String, C>,
    followers: LWWSet<String, C>,
}

impl Friendship {
    /// Create an empty friendship record for `user_key`.
    pub fn new(user_key: impl Into<String>) -> Self {
        Self::with_clock(user_key, SystemClock)
    }

    /// Create a record whose key is assigned later with
    /// [`set_user_key`](Self::set_user_key).
    pub fn unkeyed() -> Self {
        Self::unkeyed_with_clock(SystemClock)
    }

    /// Rebuild a record from a stored payload.
    pub fn from_payload(payload: FriendshipPayload) -> Self {
        Self::from_payload_with_clock(payload, SystemClock)
    }
}

impl<C: Clock + Clone> Friendship<C> {
    /// Create an empty record for `user_key` timestamping with `clock`.
    pub fn with_clock(user_key: impl Into<String>, clock: C) -> Self {
        let mut friendship = Self::unkeyed_with_clock(clock);
        friendship.user_key = Some(user_key.into());
        friendship
    }

    /// Unkeyed record timestamping with `clock`.
    pub fn unkeyed_with_clock(clock: C) -> Self {
        Self {
            user_key: None,
            following: LWWSet::with_clock(clock.clone()),
            followers: LWWSet::with_clock(clock),
        }
    }

    /// Rebuild a record from a stored payload using `clock`.
    pub fn from_payload_with_clock(payload: FriendshipPayload, clock: C) -> Self {
        Self {
            user_key: Some(payload.user_key),
            following: LWWSet::from_payload_with_clock(payload.following, clock.clone()),
            followers: LWWSet::from_payload_with_clock(payload.followers, clock),
        }
    }

    /// Assign the owner key.
    pub fn set_user_key(&mut self, user_key: impl Into<String>) {
        self.user_key = Some(user_key.into());
    }

    /// The owner key, if assigned.
    #[must_use]
    pub fn user_key(&self) -> Option<&str> {
        self.user_key.as_deref()
    }

    /// Serializable state. Fails if no key is assigned.
    pub fn payload(&self) -> Result<FriendshipPayload> {
        Ok(FriendshipPayload {
            user_key: self.require_key()?.to_string(),
            following: self.following.payload(),
            followers: self.followers.payload(),
        })
    }

    /// Derived view. Fails if no key is assigned.
    pub fn value(&self) -> Result<FriendshipValue> {
        Ok(FriendshipValue {
            user_key: self.require_key()?.to_string(),
            following: self.following.value(),
            followers: self.followers.value(),
        })
    }

    /// Merge two replicas of the same user's record into a new one.
    pub fn merged(&self, other: &Self) -> Result<Self> {
        let key = self.require_key()?;
        if other.user_key() != Some(key) {
            return Err(precondition(format!(
                "cannot merge friendship of {key:?} with {:?}",
                other.user_key()
            )));
        }
        trace!(user_key = key, "merging friendship replicas");
        Ok(Self {
            user_key: self.user_key.clone(),
            following: self.following.merged(&other.following),
            followers: self.followers.merged(&other.followers),
        })
    }

    /// Record that this user follows `friend`, updating both records.
    pub fn follow(&mut self, friend: &mut Self) -> Result<()> {
        let (me, them) = (self.require_key()?.to_string(), friend.require_key()?.to_string());
        self.following.add(them);
        friend.followers.add(me);
        Ok(())
    }

    /// Record that this user no longer follows `friend`, updating both
    /// records.
    pub fn unfollow(&mut self, friend: &mut Self) -> Result<()> {
        let (me, them) = (self.require_key()?.to_string(), friend.require_key()?.to_string());
        self.following.discard(&them)?;
        friend.followers.discard(&me)?;
        Ok(())
    }

    /// Whether this user follows `user_key`.
    #[must_use]
    pub fn is_following(&self, user_key: &str) -> bool {
        self.following.contains(&user_key.to_string())
    }

    /// Whether `user_key` follows this user.
    #[must_use]
    pub fn is_followed_by(&self, user_key: &str) -> bool {
        self.followers.contains(&user_key.to_string())
    }

    fn require_key(&self) -> Result<&str> {
        self.user_key
            .as_deref()
            .ok_or_else(|| precondition("friendship has no user_key".to_string()))
    }
}

fn precondition(message: String) -> CrdtError {
    warn!("friendship precondition violated: {message}");
    CrdtError::PreconditionViolation(message)
}
