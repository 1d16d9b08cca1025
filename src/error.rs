/*!
 * Error Handling for the Keyring Engine
 *
 * Provides structured error types with numeric error codes, user-friendly
 * messages and suggested remediation for every keyring operation.
 */

use std::collections::HashMap;
use thiserror::Error;

/// Error type for all keyring operations
#[derive(Debug, Error)]
pub enum KeyringError {
    #[error("Allocation failed: {operation} - {cause}")]
    AllocationFailure {
        operation: String,
        cause: String,
        error_code: u32,
    },

    #[error("Unsupported key store format: {format}")]
    UnsupportedFormat { format: String, error_code: u32 },

    #[error("Unsupported public-key algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String, error_code: u32 },

    #[error("Keygrip computation failed: {cause}")]
    GripError { cause: String, error_code: u32 },

    #[error("Parse error in {source_name}: {cause}")]
    ParseError {
        source_name: String,
        cause: String,
        error_code: u32,
    },

    #[error("Merge type mismatch: {details}")]
    MergeTypeMismatch { details: String, error_code: u32 },

    #[error("Merge conversion failed: {side} - {cause}")]
    MergeConversionFailed {
        side: String,
        cause: String,
        error_code: u32,
    },

    #[error("Wrong passphrase for key {keyid}")]
    WrongPassphrase { keyid: String, error_code: u32 },

    #[error("Passphrase provider cancelled {operation} for key {keyid}")]
    ProviderCancelled {
        operation: String,
        keyid: String,
        error_code: u32,
    },

    #[error("Secret material of key {keyid} is not accessible")]
    LockedMaterialUnavailable { keyid: String, error_code: u32 },

    #[error("Invalid key state: {operation} not allowed in state {state}")]
    InvalidState {
        operation: String,
        state: String,
        error_code: u32,
    },

    #[error("Search cursor is not a member of this key store")]
    InvalidCursor { error_code: u32 },

    #[error("Key not found: {what}")]
    KeyNotFound { what: String, error_code: u32 },

    #[error("Protection operation failed: {operation} - {cause}")]
    ProtectionError {
        operation: String,
        cause: String,
        error_code: u32,
        context: HashMap<String, String>,
    },

    #[error("Invalid parameter: {parameter} - {expected} - got {actual}")]
    InvalidParameter {
        parameter: String,
        expected: String,
        actual: String,
        error_code: u32,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Error code constants for different error categories
pub mod error_codes {
    // Grip errors: 1000-1999
    pub const GRIP_UNSUPPORTED_ALGORITHM: u32 = 1001;
    pub const GRIP_UNKNOWN_CURVE: u32 = 1002;
    pub const GRIP_INVALID_MATERIAL: u32 = 1003;
    pub const GRIP_SIZE_MISMATCH: u32 = 1004;

    // Key and packet errors: 2000-2999
    pub const KEY_MATERIAL_MISMATCH: u32 = 2001;
    pub const KEY_PACKET_MALFORMED: u32 = 2002;
    pub const KEY_NOT_FOUND: u32 = 2003;
    pub const KEY_INVALID_HEX: u32 = 2004;

    // Merge errors: 3000-3999
    pub const MERGE_GRIP_MISMATCH: u32 = 3001;
    pub const MERGE_KIND_MISMATCH: u32 = 3002;
    pub const MERGE_CONVERSION_FAILED: u32 = 3003;

    // Protection errors: 4000-4999
    pub const WRONG_PASSPHRASE: u32 = 4001;
    pub const PROVIDER_CANCELLED: u32 = 4002;
    pub const LOCKED_MATERIAL_UNAVAILABLE: u32 = 4003;
    pub const INVALID_KEY_STATE: u32 = 4004;
    pub const KEY_DERIVATION_FAILED: u32 = 4005;
    pub const ENCRYPTION_FAILED: u32 = 4006;

    // Store errors: 5000-5999
    pub const STORE_ALLOCATION_FAILED: u32 = 5001;
    pub const STORE_INVALID_CURSOR: u32 = 5002;
    pub const STORE_UNSUPPORTED_FORMAT: u32 = 5003;

    // Format and IO errors: 6000-6999
    pub const FORMAT_PARSE_FAILED: u32 = 6001;
    pub const FORMAT_WRITE_FAILED: u32 = 6002;
    pub const FORMAT_NOT_A_DIRECTORY: u32 = 6003;
}

impl KeyringError {
    /// Get the numeric error code for this error
    pub fn error_code(&self) -> u32 {
        match self {
            KeyringError::AllocationFailure { error_code, .. } => *error_code,
            KeyringError::UnsupportedFormat { error_code, .. } => *error_code,
            KeyringError::UnsupportedAlgorithm { error_code, .. } => *error_code,
            KeyringError::GripError { error_code, .. } => *error_code,
            KeyringError::ParseError { error_code, .. } => *error_code,
            KeyringError::MergeTypeMismatch { error_code, .. } => *error_code,
            KeyringError::MergeConversionFailed { error_code, .. } => *error_code,
            KeyringError::WrongPassphrase { error_code, .. } => *error_code,
            KeyringError::ProviderCancelled { error_code, .. } => *error_code,
            KeyringError::LockedMaterialUnavailable { error_code, .. } => *error_code,
            KeyringError::InvalidState { error_code, .. } => *error_code,
            KeyringError::InvalidCursor { error_code } => *error_code,
            KeyringError::KeyNotFound { error_code, .. } => *error_code,
            KeyringError::ProtectionError { error_code, .. } => *error_code,
            KeyringError::InvalidParameter { error_code, .. } => *error_code,
            KeyringError::SerializationError(_) => 9001,
            KeyringError::IoError(_) => 9002,
        }
    }

    /// Get a user-friendly error message
    pub fn user_friendly_message(&self) -> String {
        match self {
            KeyringError::AllocationFailure { operation, .. } => {
                format!("Operation '{}' ran out of memory. The keyring was left unchanged.", operation)
            }
            KeyringError::UnsupportedFormat { format, .. } => {
                format!("Key store format '{}' is not supported for this operation.", format)
            }
            KeyringError::UnsupportedAlgorithm { algorithm, .. } => {
                format!("Public-key algorithm '{}' is not supported.", algorithm)
            }
            KeyringError::GripError { .. } => {
                "The keygrip of this key could not be computed.".to_string()
            }
            KeyringError::ParseError { source_name, .. } => {
                format!("Key data in '{}' could not be parsed. It may be corrupted.", source_name)
            }
            KeyringError::MergeTypeMismatch { .. } => {
                "Two different keys were presented for merging. The existing key was kept.".to_string()
            }
            KeyringError::MergeConversionFailed { side, .. } => {
                format!("The {} key contains malformed packets and could not be merged.", side)
            }
            KeyringError::WrongPassphrase { keyid, .. } => {
                format!("The passphrase for key {} is incorrect.", keyid)
            }
            KeyringError::ProviderCancelled { keyid, .. } => {
                format!("No passphrase was supplied for key {}.", keyid)
            }
            KeyringError::LockedMaterialUnavailable { keyid, .. } => {
                format!("Key {} must be unlocked before its protection can change.", keyid)
            }
            KeyringError::InvalidState { operation, state, .. } => {
                format!("Cannot {} a key that is {}.", operation, state)
            }
            KeyringError::InvalidCursor { .. } => {
                "The search was resumed from a key that is not part of this keyring.".to_string()
            }
            KeyringError::KeyNotFound { what, .. } => {
                format!("No key matching {} exists in the keyring.", what)
            }
            KeyringError::ProtectionError { operation, .. } => {
                format!("Secret key protection step '{}' failed.", operation)
            }
            KeyringError::InvalidParameter {
                parameter,
                expected,
                ..
            } => {
                format!(
                    "Invalid parameter '{}'. Expected '{}' format.",
                    parameter, expected
                )
            }
            KeyringError::SerializationError(_) => {
                "Key serialization failed. Data format may be corrupted.".to_string()
            }
            KeyringError::IoError(_) => {
                "Input/output operation failed. Check file permissions and disk space.".to_string()
            }
        }
    }

    /// Get technical details for debugging
    pub fn technical_details(&self) -> HashMap<String, String> {
        let mut details = HashMap::new();

        details.insert("error_code".to_string(), self.error_code().to_string());
        details.insert("error_type".to_string(), self.error_type().to_string());
        details.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());

        match self {
            KeyringError::ProtectionError {
                operation,
                cause,
                context,
                ..
            } => {
                details.insert("operation".to_string(), operation.clone());
                details.insert("cause".to_string(), cause.clone());
                details.extend(context.clone());
            }
            KeyringError::MergeConversionFailed { side, cause, .. } => {
                details.insert("side".to_string(), side.clone());
                details.insert("cause".to_string(), cause.clone());
            }
            KeyringError::GripError { cause, .. } => {
                details.insert("cause".to_string(), cause.clone());
            }
            KeyringError::ParseError {
                source_name, cause, ..
            } => {
                details.insert("source".to_string(), source_name.clone());
                details.insert("cause".to_string(), cause.clone());
            }
            KeyringError::InvalidParameter {
                parameter,
                expected,
                actual,
                ..
            } => {
                details.insert("parameter".to_string(), parameter.clone());
                details.insert("expected".to_string(), expected.clone());
                details.insert("actual".to_string(), actual.clone());
            }
            _ => {
                details.insert("details".to_string(), format!("{:?}", self));
            }
        }

        details
    }

    /// Get suggested remediation steps
    pub fn suggested_remediation(&self) -> Option<String> {
        match self {
            KeyringError::WrongPassphrase { .. } => {
                Some("Retry with the passphrase the key was last protected with.".to_string())
            }
            KeyringError::ProviderCancelled { .. } => {
                Some("Supply a non-empty passphrase, or retry the operation.".to_string())
            }
            KeyringError::LockedMaterialUnavailable { .. } => {
                Some("Unlock or unprotect the key first, then protect it again.".to_string())
            }
            KeyringError::UnsupportedAlgorithm { .. } => Some(
                "Use an RSA, DSA, ElGamal, ECDH, ECDSA, EdDSA or SM2 key.".to_string(),
            ),
            KeyringError::ParseError { .. } => {
                Some("Re-export the key from its source keyring.".to_string())
            }
            KeyringError::InvalidCursor { .. } => {
                Some("Restart the search without a cursor.".to_string())
            }
            _ => None,
        }
    }

    /// Get the error category/type as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            KeyringError::AllocationFailure { .. } => "AllocationFailure",
            KeyringError::UnsupportedFormat { .. } => "UnsupportedFormat",
            KeyringError::UnsupportedAlgorithm { .. } => "UnsupportedAlgorithm",
            KeyringError::GripError { .. } => "GripError",
            KeyringError::ParseError { .. } => "ParseError",
            KeyringError::MergeTypeMismatch { .. } => "MergeTypeMismatch",
            KeyringError::MergeConversionFailed { .. } => "MergeConversionFailed",
            KeyringError::WrongPassphrase { .. } => "WrongPassphrase",
            KeyringError::ProviderCancelled { .. } => "ProviderCancelled",
            KeyringError::LockedMaterialUnavailable { .. } => "LockedMaterialUnavailable",
            KeyringError::InvalidState { .. } => "InvalidState",
            KeyringError::InvalidCursor { .. } => "InvalidCursor",
            KeyringError::KeyNotFound { .. } => "KeyNotFound",
            KeyringError::ProtectionError { .. } => "ProtectionError",
            KeyringError::InvalidParameter { .. } => "InvalidParameter",
            KeyringError::SerializationError(_) => "SerializationError",
            KeyringError::IoError(_) => "IoError",
        }
    }

    /// Whether the caller may retry the same operation, e.g. with another passphrase
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KeyringError::WrongPassphrase { .. } | KeyringError::ProviderCancelled { .. }
        )
    }
}

/// Convenience constructors for common error types
impl KeyringError {
    pub fn unsupported_algorithm(algorithm: &str) -> Self {
        KeyringError::UnsupportedAlgorithm {
            algorithm: algorithm.to_string(),
            error_code: error_codes::GRIP_UNSUPPORTED_ALGORITHM,
        }
    }

    pub fn grip_error(cause: &str, error_code: u32) -> Self {
        KeyringError::GripError {
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn unsupported_format(format: &str) -> Self {
        KeyringError::UnsupportedFormat {
            format: format.to_string(),
            error_code: error_codes::STORE_UNSUPPORTED_FORMAT,
        }
    }

    pub fn parse_error(source_name: &str, cause: &str) -> Self {
        KeyringError::ParseError {
            source_name: source_name.to_string(),
            cause: cause.to_string(),
            error_code: error_codes::FORMAT_PARSE_FAILED,
        }
    }

    pub fn merge_mismatch(details: &str, error_code: u32) -> Self {
        KeyringError::MergeTypeMismatch {
            details: details.to_string(),
            error_code,
        }
    }

    pub fn merge_conversion(side: &str, cause: &str) -> Self {
        KeyringError::MergeConversionFailed {
            side: side.to_string(),
            cause: cause.to_string(),
            error_code: error_codes::MERGE_CONVERSION_FAILED,
        }
    }

    pub fn wrong_passphrase(keyid: &str) -> Self {
        KeyringError::WrongPassphrase {
            keyid: keyid.to_string(),
            error_code: error_codes::WRONG_PASSPHRASE,
        }
    }

    pub fn provider_cancelled(operation: &str, keyid: &str) -> Self {
        KeyringError::ProviderCancelled {
            operation: operation.to_string(),
            keyid: keyid.to_string(),
            error_code: error_codes::PROVIDER_CANCELLED,
        }
    }

    pub fn locked_material(keyid: &str) -> Self {
        KeyringError::LockedMaterialUnavailable {
            keyid: keyid.to_string(),
            error_code: error_codes::LOCKED_MATERIAL_UNAVAILABLE,
        }
    }

    pub fn invalid_state(operation: &str, state: &str) -> Self {
        KeyringError::InvalidState {
            operation: operation.to_string(),
            state: state.to_string(),
            error_code: error_codes::INVALID_KEY_STATE,
        }
    }

    pub fn invalid_cursor() -> Self {
        KeyringError::InvalidCursor {
            error_code: error_codes::STORE_INVALID_CURSOR,
        }
    }

    pub fn key_not_found(what: &str) -> Self {
        KeyringError::KeyNotFound {
            what: what.to_string(),
            error_code: error_codes::KEY_NOT_FOUND,
        }
    }

    pub fn protection_error(operation: &str, cause: &str, error_code: u32) -> Self {
        KeyringError::ProtectionError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
            context: HashMap::new(),
        }
    }

    pub fn invalid_parameter(parameter: &str, expected: &str, actual: &str) -> Self {
        KeyringError::InvalidParameter {
            parameter: parameter.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            error_code: 9999,
        }
    }

    pub fn allocation_failure(operation: &str, cause: &str) -> Self {
        KeyringError::AllocationFailure {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code: error_codes::STORE_ALLOCATION_FAILED,
        }
    }

    pub fn io_error(cause: &str) -> Self {
        KeyringError::IoError(cause.to_string())
    }
}

// From implementations for automatic error conversion
impl From<std::io::Error> for KeyringError {
    fn from(err: std::io::Error) -> Self {
        KeyringError::io_error(&format!("IO operation failed: {}", err))
    }
}

impl From<bincode::Error> for KeyringError {
    fn from(err: bincode::Error) -> Self {
        KeyringError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for KeyringError {
    fn from(err: serde_json::Error) -> Self {
        KeyringError::SerializationError(format!("JSON error: {}", err))
    }
}

/// Result type alias for keyring operations
pub type KeyringResult<T> = Result<T, KeyringError>;
