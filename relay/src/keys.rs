use shared::{Error, Result};

// Characters that collide with namespace and versioning syntax in common
// backends; both contracts refuse them up front.
const RESERVED: &[char] = &['{', '}', '(', ')', '/', '\\', '@', ':'];

/// Check a single key for legality: non-empty, no reserved characters.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key is empty".to_string()));
    }
    if let Some(c) = key.chars().find(|c| RESERVED.contains(c)) {
        return Err(Error::InvalidKey(format!(
            "key {key:?} contains reserved character {c:?}"
        )));
    }
    Ok(())
}

/// Check every key of a bulk input before any underlying call is made.
pub fn validate_keys(keys: &[String]) -> Result<()> {
    keys.iter().try_for_each(|key| validate_key(key))
}
