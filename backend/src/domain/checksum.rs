//! Request authentication by parameter checksum.
//!
//! Every leaderboard operation is signed by the caller: the operation's
//! named parameters are canonicalised, the shared secret is appended, and the
//! SHA-256 digest of the result travels alongside the request. The server
//! recomputes the digest with [`ChecksumAuthenticator`] before touching the
//! store.
//!
//! Canonical form: parameter names sorted lexicographically, each followed
//! by its value when present. An absent (null) value contributes the name and
//! a single NUL marker, so `absent`, `""`, and "not in the set" all produce
//! different digests.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::{Error, ErrorReason};

const ABSENT_MARKER: char = '\0';

/// Errors raised while building a [`SharedSecret`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SharedSecretError {
    /// The secret was empty once trimmed.
    #[error("shared secret must not be blank")]
    Blank,
}

/// Secret shared between the service and legitimate callers.
///
/// The value is zeroised on drop and never printed by `Debug`.
#[derive(Clone)]
pub struct SharedSecret(Zeroizing<String>);

impl SharedSecret {
    /// Wrap `raw`, rejecting blank values.
    ///
    /// # Examples
    /// ```
    /// use leaderboard::domain::SharedSecret;
    ///
    /// assert!(SharedSecret::new("s3cr3t").is_ok());
    /// assert!(SharedSecret::new("  ").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, SharedSecretError> {
        let raw = Zeroizing::new(raw.into());
        if raw.trim().is_empty() {
            return Err(SharedSecretError::Blank);
        }
        Ok(Self(raw))
    }

    fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Named parameters of one operation, in canonical (sorted) order.
///
/// # Examples
/// ```
/// use leaderboard::domain::ParamSet;
///
/// let params = ParamSet::new()
///     .with("userId", "u1")
///     .with_optional("nickname", None::<String>);
/// assert_eq!(params.canonical_form(), "nickname\0userIdu1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    entries: BTreeMap<String, Option<String>>,
}

impl ParamSet {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter with a present value, rendered through `Display`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.entries.insert(name.into(), Some(value.to_string()));
        self
    }

    /// Add a parameter whose value may be absent.
    #[must_use]
    pub fn with_optional<V: fmt::Display>(
        mut self,
        name: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        self.entries
            .insert(name.into(), value.map(|value| value.to_string()));
        self
    }

    /// Concatenated canonical form, without the secret.
    #[must_use]
    pub fn canonical_form(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.entries {
            out.push_str(name);
            match value {
                Some(value) => out.push_str(value),
                None => out.push(ABSENT_MARKER),
            }
        }
        out
    }
}

/// Operation parameters that take part in the checksum.
pub trait SignedParams {
    /// Parameters covered by the checksum, digest excluded.
    fn param_set(&self) -> ParamSet;
}

impl SignedParams for ParamSet {
    fn param_set(&self) -> ParamSet {
        self.clone()
    }
}

/// Hex-encoded checksum supplied by a caller or computed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumDigest(String);

impl ChecksumDigest {
    /// Wrap a caller-supplied digest verbatim.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl AsRef<str> for ChecksumDigest {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ChecksumDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An operation's parameters together with the caller's digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest<T> {
    /// Operation parameters.
    pub params: T,
    /// Digest supplied by the caller, if any.
    pub digest: Option<ChecksumDigest>,
}

impl<T> SignedRequest<T> {
    /// Pair `params` with the caller's digest.
    pub fn new(params: T, digest: Option<ChecksumDigest>) -> Self {
        Self { params, digest }
    }
}

/// Reasons a checksum is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// No digest accompanied the request.
    #[error("no checksum supplied")]
    NoDigest,
    /// A digest was supplied but does not match.
    #[error("checksum mismatch")]
    Mismatch,
}

impl From<AuthFailure> for Error {
    fn from(value: AuthFailure) -> Self {
        match value {
            AuthFailure::NoDigest => ErrorReason::NoDigest.into(),
            AuthFailure::Mismatch => ErrorReason::Mismatch.into(),
        }
    }
}

/// Computes and verifies request checksums against the shared secret.
#[derive(Debug, Clone)]
pub struct ChecksumAuthenticator {
    secret: SharedSecret,
}

impl ChecksumAuthenticator {
    /// Create an authenticator bound to `secret`.
    #[must_use]
    pub fn new(secret: SharedSecret) -> Self {
        Self { secret }
    }

    /// Digest of `params` under the shared secret, lowercase hex.
    ///
    /// # Examples
    /// ```
    /// use leaderboard::domain::{ChecksumAuthenticator, ParamSet, SharedSecret};
    ///
    /// let auth = ChecksumAuthenticator::new(SharedSecret::new("secret").expect("secret"));
    /// let digest = auth.compute(&ParamSet::new().with("userId", "u1"));
    /// assert_eq!(digest.as_ref().len(), 64);
    /// ```
    #[must_use]
    pub fn compute(&self, params: &ParamSet) -> ChecksumDigest {
        let mut canonical = Zeroizing::new(params.canonical_form());
        canonical.push_str(self.secret.expose());
        ChecksumDigest(hex::encode(Sha256::digest(canonical.as_bytes())))
    }

    /// Check `supplied` against the digest of `params`.
    pub fn verify(
        &self,
        params: &ParamSet,
        supplied: Option<&ChecksumDigest>,
    ) -> Result<(), AuthFailure> {
        let supplied = supplied.ok_or(AuthFailure::NoDigest)?;
        if self.compute(params) == *supplied {
            Ok(())
        } else {
            Err(AuthFailure::Mismatch)
        }
    }

    /// Verify a signed request using its own parameter set.
    pub fn authenticate<T: SignedParams>(&self, request: &SignedRequest<T>) -> Result<(), AuthFailure> {
        self.verify(&request.params.param_set(), request.digest.as_ref())
    }
}
