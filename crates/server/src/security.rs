use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON parser with limits for documents coming from outside the process:
/// token endpoint responses, provider key sets and the local JWKS file.
pub struct SecureJsonParser {
    max_size: usize,
    max_depth: usize,
    max_string_length: usize,
    max_array_length: usize,
}

impl Default for SecureJsonParser {
    fn default() -> Self {
        Self {
            max_size: 256 * 1024,         // token responses and key sets are small
            max_depth: 16,
            max_string_length: 32 * 1024, // large enough for an RSA-4096 modulus or a JWT
            max_array_length: 256,        // keys in a set
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JsonSecurityError {
    #[error("JSON too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },
    #[error("JSON too deep: {depth} levels (max: {max})")]
    TooDeep { depth: usize, max: usize },
    #[error("String too long: {length} chars (max: {max})")]
    StringTooLong { length: usize, max: usize },
    #[error("Array too large: {length} elements (max: {max})")]
    ArrayTooLarge { length: usize, max: usize },
    #[error("JSON parsing error: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl SecureJsonParser {
    /// Parse bytes into an untyped value after checking size and structure.
    pub fn parse_value(&self, data: &[u8]) -> Result<Value, JsonSecurityError> {
        if data.len() > self.max_size {
            return Err(JsonSecurityError::TooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let value: Value = serde_json::from_slice(data)?;
        self.validate_structure(&value, 0)?;
        Ok(value)
    }

    /// Parse bytes into `T` with the same limits as [`Self::parse_value`].
    pub fn parse<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, JsonSecurityError> {
        let value = self.parse_value(data)?;
        Ok(serde_json::from_value(value)?)
    }

    fn validate_structure(&self, value: &Value, depth: usize) -> Result<(), JsonSecurityError> {
        if depth > self.max_depth {
            return Err(JsonSecurityError::TooDeep {
                depth,
                max: self.max_depth,
            });
        }

        match value {
            Value::String(s) => self.check_string(s),
            Value::Array(arr) => {
                if arr.len() > self.max_array_length {
                    return Err(JsonSecurityError::ArrayTooLarge {
                        length: arr.len(),
                        max: self.max_array_length,
                    });
                }
                arr.iter()
                    .try_for_each(|item| self.validate_structure(item, depth + 1))
            }
            Value::Object(obj) => obj.iter().try_for_each(|(key, val)| {
                self.check_string(key)?;
                self.validate_structure(val, depth + 1)
            }),
            _ => Ok(()),
        }
    }

    fn check_string(&self, s: &str) -> Result<(), JsonSecurityError> {
        if s.len() > self.max_string_length {
            return Err(JsonSecurityError::StringTooLong {
                length: s.len(),
                max: self.max_string_length,
            });
        }
        Ok(())
    }
}

/// Convenience function for bounded parsing with default limits.
pub fn secure_parse<T: DeserializeOwned>(data: &[u8]) -> Result<T, JsonSecurityError> {
    SecureJsonParser::default().parse(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit() {
        let large_json = "\"".to_string() + &"a".repeat(512 * 1024) + "\"";
        let result = SecureJsonParser::default().parse_value(large_json.as_bytes());
        assert!(matches!(result, Err(JsonSecurityError::TooLarge { .. })));
    }

    #[test]
    fn test_depth_limit() {
        let mut deep_json = String::new();
        for _ in 0..20 {
            deep_json.push_str("{\"a\":");
        }
        deep_json.push('1');
        for _ in 0..20 {
            deep_json.push('}');
        }

        let result = SecureJsonParser::default().parse_value(deep_json.as_bytes());
        assert!(matches!(result, Err(JsonSecurityError::TooDeep { .. })));
    }

    #[test]
    fn test_typed_parse() {
        #[derive(serde::Deserialize)]
        struct Tokens {
            id_token: String,
        }

        let tokens: Tokens = secure_parse(br#"{"id_token":"a.b.c","token_type":"Bearer"}"#).unwrap();
        assert_eq!(tokens.id_token, "a.b.c");
    }
}
