//! Transaction payload handling.
//!
//! The signed transaction is an opaque blob. Two encoding decisions are made
//! on its way out:
//!
//! 1. Input resolution: the bytes handed to the client (usually read from a
//!    file) may already be base64 text or raw wire bytes. `auto` detects
//!    which, `base64`/`raw` force the interpretation.
//! 2. Wire encoding: how the raw bytes are encoded into the single
//!    `sendTransaction` JSON-RPC param, base58 or base64.
//!
//! Whatever the combination, decoding the forwarded param reproduces the raw
//! bytes exactly.

use {
    base64::{Engine, prelude::BASE64_STANDARD},
    serde::Deserialize,
    std::str::FromStr,
    thiserror::Error,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("empty payload")]
    Empty,

    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
}

/// Interpretation of the input buffer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    #[default]
    Auto,
    Base64,
    Raw,
}

impl FromStr for PayloadEncoding {
    type Err = PayloadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auto" => Ok(Self::Auto),
            "base64" => Ok(Self::Base64),
            "raw" => Ok(Self::Raw),
            other => Err(PayloadError::UnsupportedEncoding(other.to_owned())),
        }
    }
}

impl PayloadEncoding {
    /// Resolves the input buffer to raw transaction bytes.
    pub fn resolve(self, data: &[u8]) -> Result<Vec<u8>, PayloadError> {
        if data.trim_ascii_end().is_empty() {
            return Err(PayloadError::Empty);
        }
        match self {
            Self::Auto => match base64_text(data) {
                Some(text) => Ok(BASE64_STANDARD.decode(text)?),
                None => Ok(data.to_vec()),
            },
            Self::Base64 => {
                let text = data.trim_ascii_end();
                Ok(BASE64_STANDARD.decode(text)?)
            }
            Self::Raw => Ok(data.to_vec()),
        }
    }
}

/// Strict check: the whole buffer (modulo a trailing newline) must decode as
/// canonical base64 to be treated as text.
fn base64_text(data: &[u8]) -> Option<&[u8]> {
    let text = data.trim_ascii_end();
    if std::str::from_utf8(text).is_err() {
        return None;
    }
    BASE64_STANDARD.decode(text).ok().map(|_| text)
}

/// Encoding of the transaction inside the JSON-RPC param.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireEncoding {
    #[default]
    Base58,
    Base64,
}

impl WireEncoding {
    pub fn encode(self, raw: &[u8]) -> String {
        match self {
            Self::Base58 => bs58::encode(raw).into_string(),
            Self::Base64 => BASE64_STANDARD.encode(raw),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base58 => "base58",
            Self::Base64 => "base64",
        }
    }
}
