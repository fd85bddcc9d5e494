//! Hashing collections used throughout the crate.
//!
//! We key almost everything on small integer handles, so the std SipHash
//! default is wasted work; rustc-hash is the drop-in replacement.

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;
