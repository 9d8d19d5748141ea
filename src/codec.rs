//! JSON encoding of CRDT payloads.
//!
//! Payloads are plain maps, sequences and scalars, so any self-describing
//! format works; JSON is the one the stores use. Decoding failures surface as
//! [`CrdtError::MalformedPayload`](crate::CrdtError::MalformedPayload) and
//! never yield a partially built payload.
//!
//! ```
//! use crdt_toolbox::codec;
//! use crdt_toolbox::prelude::*;
//!
//! let mut counter = PNCounter::new("a");
//! counter.decrement();
//!
//! let doc = codec::to_json(&counter).unwrap();
//! let payload = codec::from_json::<PNCounter>(doc).unwrap();
//! assert_eq!(PNCounter::from_payload("a", payload).value(), -1);
//! ```

use serde_json::Value;

use crate::{Crdt, Result};

/// Encode a CRDT's payload as a JSON document.
pub fn to_json<C: Crdt>(crdt: &C) -> Result<Value> {
    Ok(serde_json::to_value(crdt.payload())?)
}

/// Decode a JSON document into the payload type of `C`.
pub fn from_json<C: Crdt>(doc: Value) -> Result<C::Payload> {
    Ok(serde_json::from_value(doc)?)
}

/// Encode a CRDT's payload as JSON bytes.
pub fn to_vec<C: Crdt>(crdt: &C) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&crdt.payload())?)
}

/// Decode JSON bytes into the payload type of `C`.
pub fn from_slice<C: Crdt>(bytes: &[u8]) -> Result<C::Payload> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Replace `crdt`'s payload with one decoded from `doc`.
///
/// On error `crdt` is left untouched.
pub fn load_into<C: Crdt>(crdt: &mut C, doc: Value) -> Result<()> {
    let payload = from_json::<C>(doc)?;
    crdt.set_payload(payload);
    Ok(())
}

/// Element-keyed maps as a sorted sequence of `[element, value]` pairs.
///
/// JSON object keys must be strings, so a map keyed by arbitrary elements
/// (tuples, integers, structs) is written as pairs instead. A repeated
/// element on decode is rejected.
pub(crate) mod pairs {
    use std::collections::BTreeMap;

    use serde::de::{Deserialize, DeserializeOwned, Deserializer, Error};
    use serde::ser::{Serialize, Serializer};

    pub(crate) fn serialize<K, V, S>(
        map: &BTreeMap<K, V>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map)
    }

    pub(crate) fn deserialize<'de, K, V, D>(
        deserializer: D,
    ) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: Ord + DeserializeOwned,
        V: DeserializeOwned,
        D: Deserializer<'de>,
    {
        let entries = Vec::<(K, V)>::deserialize(deserializer)?;
        let len = entries.len();
        let map: BTreeMap<K, V> = entries.into_iter().collect();
        if map.len() != len {
            return Err(D::Error::custom("duplicate element in pair list"));
        }
        Ok(map)
    }
}
