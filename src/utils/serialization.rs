use anyhow::Result;

/// Get the bincode configuration
fn get_config() -> impl bincode::config::Config {
    // Legacy layout keeps serde compatibility; the limit guards against corrupt length prefixes
    bincode::config::legacy().with_limit::<{ 256 * 1024 * 1024 }>()
}

/// Serialize data using bincode v2.0 with serde
///
/// # Errors
///
/// Returns an error if:
/// - Serialization fails
pub fn serialize<T: serde::Serialize>(data: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(data, get_config()).map_err(Into::into)
}

/// Deserialize data using bincode v2.0 with serde
///
/// Trailing bytes after a complete value are rejected so a truncated or
/// concatenated file is not mistaken for valid state.
///
/// # Errors
///
/// Returns an error if:
/// - Deserialization fails
/// - Data is malformed or incompatible
pub fn deserialize<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (result, bytes_read) = bincode::serde::decode_from_slice(bytes, get_config())?;
    if bytes_read != bytes.len() {
        anyhow::bail!(
            "{} trailing bytes after encoded value",
            bytes.len() - bytes_read
        );
    }
    Ok(result)
}

/// Serialize data as pretty-printed JSON
///
/// # Errors
///
/// Returns an error if a map key does not serialize as a string
/// (for example a non-UTF-8 path).
pub fn to_json<T: serde::Serialize>(data: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(data)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Deserialize data from JSON
///
/// # Errors
///
/// Returns an error if the document is not valid JSON for `T`.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}
