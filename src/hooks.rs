//! Trait boundaries for the external collaborators this backend does not
//! implement itself: entry serialization, schema enforcement, credential
//! verification, and referral policy. Each ships a minimal default so the
//! backend is usable standalone; richer collaborators plug in by swapping
//! the `Arc<dyn Trait>` stored on [`crate::backend::Backend`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::dn::Dn;
use crate::entry::Entry;
use crate::error::{Error, Result};

/// Serializes an [`Entry`] to and from its on-disk byte representation.
pub trait EntryCodec: Send + Sync {
    /// Serialize `entry` to bytes suitable for [`crate::fileio::write_atomic`].
    fn encode(&self, entry: &Entry) -> Vec<u8>;
    /// Parse bytes read from an entry file back into an [`Entry`].
    ///
    /// The returned entry's `normalized_name` carries only the leaf RDN;
    /// the caller is responsible for prefixing the inherited parent DN.
    fn decode(&self, bytes: &[u8]) -> Result<Entry>;
}

/// Line-oriented `attr: value` codec, blank-line terminated. Binary values
/// (anything not valid UTF-8 on decode, or opted into explicitly) use the
/// `attr:: ` double-colon marker with base64-encoded content.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineCodec;

impl EntryCodec for LineCodec {
    fn encode(&self, entry: &Entry) -> Vec<u8> {
        let mut out = format!("dn: {}\n", entry.name);
        for (attr, values) in &entry.attributes {
            for value in values {
                if is_safe_value(value) {
                    out.push_str(attr);
                    out.push_str(": ");
                    out.push_str(value);
                    out.push('\n');
                } else {
                    out.push_str(attr);
                    out.push_str(":: ");
                    out.push_str(&BASE64.encode(value.as_bytes()));
                    out.push('\n');
                }
            }
        }
        out.into_bytes()
    }

    fn decode(&self, bytes: &[u8]) -> Result<Entry> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::Other(format!("entry file is not valid UTF-8: {e}")))?;

        let mut name = String::new();
        let mut attributes = std::collections::BTreeMap::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix("dn:: ") {
                let decoded = BASE64
                    .decode(rest)
                    .map_err(|e| Error::Other(format!("bad base64 dn: {e}")))?;
                name = String::from_utf8(decoded)
                    .map_err(|e| Error::Other(format!("dn is not valid UTF-8: {e}")))?;
                continue;
            }
            if let Some(rest) = line.strip_prefix("dn: ") {
                name = rest.to_string();
                continue;
            }
            if let Some((attr, rest)) = line.split_once(":: ") {
                let decoded = BASE64
                    .decode(rest)
                    .map_err(|e| Error::Other(format!("bad base64 value for {attr}: {e}")))?;
                let value = String::from_utf8(decoded)
                    .map_err(|e| Error::Other(format!("value for {attr} is not valid UTF-8: {e}")))?;
                attributes
                    .entry(attr.to_string())
                    .or_insert_with(Vec::new)
                    .push(value);
            } else if let Some((attr, rest)) = line.split_once(": ") {
                attributes
                    .entry(attr.to_string())
                    .or_insert_with(Vec::new)
                    .push(rest.to_string());
            }
        }

        Ok(Entry {
            normalized_name: Dn::parse(&name),
            name,
            attributes,
            schema_checked: false,
        })
    }
}

/// `true` iff `value` can be written as a plain `attr: value` line: no
/// leading space/colon, no embedded newline or null byte.
fn is_safe_value(value: &str) -> bool {
    !value.starts_with(' ')
        && !value.starts_with(':')
        && !value.contains('\n')
        && !value.contains('\0')
}

/// Accepts or rejects an entry's schema before it is written.
pub trait SchemaValidator: Send + Sync {
    /// `Ok(())` if `entry` is well-formed enough to persist.
    fn validate(&self, entry: &Entry) -> Result<()>;
}

/// Accepts any entry carrying at least one `objectClass` value and a naming
/// attribute consistent with its leaf RDN. Real attribute syntaxes,
/// MUST/MAY rules, and structural class checks belong to a higher layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinimalSchemaValidator;

impl SchemaValidator for MinimalSchemaValidator {
    fn validate(&self, entry: &Entry) -> Result<()> {
        if !entry.has_attribute("objectClass") {
            return Err(Error::UnwillingToPerform);
        }
        let Some(leaf) = entry.normalized_name.leaf() else {
            return Ok(());
        };
        let Some((naming_attr, naming_value)) = leaf.split_once('=') else {
            return Err(Error::UnwillingToPerform);
        };
        let matches = entry
            .values(naming_attr)
            .iter()
            .any(|v| v.eq_ignore_ascii_case(naming_value));
        if matches {
            Ok(())
        } else {
            Err(Error::UnwillingToPerform)
        }
    }
}

/// Verifies bind credentials against an entry.
pub trait PasswordVerifier: Send + Sync {
    /// `Ok(())` if `credentials` authenticate `entry`.
    fn verify(&self, entry: &Entry, credentials: &[u8]) -> Result<()>;
}

/// Compares `credentials` against the entry's `userPassword` attribute in
/// constant time. Real deployments plug in a verifier that understands
/// hashing schemes (SSHA, bcrypt, argon2); those are out of scope here.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainPasswordVerifier;

impl PasswordVerifier for PlainPasswordVerifier {
    fn verify(&self, entry: &Entry, credentials: &[u8]) -> Result<()> {
        let Some(stored) = entry.first_value("userPassword") else {
            return Err(Error::InappropriateAuth);
        };
        if constant_time_eq(stored.as_bytes(), credentials) {
            Ok(())
        } else {
            Err(Error::InvalidCredentials)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Decides whether an entry redirects to another server, and what to return
/// when an entry is entirely missing.
pub trait ReferralPolicy: Send + Sync {
    /// `true` iff `entry` should redirect rather than be operated on
    /// directly.
    fn is_referral(&self, entry: &Entry) -> bool;
    /// The URIs to redirect to, when `is_referral` is true.
    fn referrals_of(&self, entry: &Entry) -> Vec<String>;
    /// Referrals to use when no ancestor entry exists at all.
    fn default_referrals(&self) -> Vec<String>;
}

/// Treats an entry as a referral iff it carries `objectClass: referral`,
/// reading redirect targets from its `ref` attribute. No default referrals.
#[derive(Debug, Default, Clone)]
pub struct SimpleReferralPolicy {
    defaults: Vec<String>,
}

impl SimpleReferralPolicy {
    /// Build a policy that falls back to `defaults` when nothing in the
    /// namespace matches at all.
    pub fn new(defaults: Vec<String>) -> Self {
        SimpleReferralPolicy { defaults }
    }
}

impl ReferralPolicy for SimpleReferralPolicy {
    fn is_referral(&self, entry: &Entry) -> bool {
        entry
            .values("objectClass")
            .iter()
            .any(|v| v.eq_ignore_ascii_case("referral"))
    }

    fn referrals_of(&self, entry: &Entry) -> Vec<String> {
        entry.values("ref").to_vec()
    }

    fn default_referrals(&self) -> Vec<String> {
        self.defaults.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_codec_roundtrips_simple_entry() {
        let mut entry = Entry::new("cn=alice,dc=example,dc=com".into(), Dn::parse("cn=alice"));
        entry.add_value("objectClass", "person".into());
        entry.add_value("cn", "alice".into());

        let codec = LineCodec;
        let bytes = codec.encode(&entry);
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.name, entry.name);
        assert_eq!(decoded.values("cn"), entry.values("cn"));
        assert_eq!(decoded.values("objectClass"), entry.values("objectClass"));
    }

    #[test]
    fn line_codec_base64_encodes_unsafe_value() {
        let mut entry = Entry::new("cn=alice".into(), Dn::parse("cn=alice"));
        entry.add_value("description", " leading space".into());

        let codec = LineCodec;
        let bytes = codec.encode(&entry);
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("description:: "));
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.values("description"), &[" leading space".to_string()]);
    }

    #[test]
    fn minimal_validator_requires_object_class() {
        let entry = Entry::new("cn=alice".into(), Dn::parse("cn=alice"));
        assert!(MinimalSchemaValidator.validate(&entry).is_err());
    }

    #[test]
    fn minimal_validator_requires_naming_attribute_match() {
        let mut entry = Entry::new("cn=alice".into(), Dn::parse("cn=alice"));
        entry.add_value("objectClass", "person".into());
        entry.add_value("cn", "bob".into());
        assert!(MinimalSchemaValidator.validate(&entry).is_err());
        entry.add_value("cn", "alice".into());
        assert!(MinimalSchemaValidator.validate(&entry).is_ok());
    }

    #[test]
    fn password_verifier_distinguishes_absent_from_wrong() {
        let mut entry = Entry::new("cn=alice".into(), Dn::parse("cn=alice"));
        assert!(matches!(
            PlainPasswordVerifier.verify(&entry, b"x"),
            Err(Error::InappropriateAuth)
        ));
        entry.add_value("userPassword", "secret".into());
        assert!(matches!(
            PlainPasswordVerifier.verify(&entry, b"wrong"),
            Err(Error::InvalidCredentials)
        ));
        assert!(PlainPasswordVerifier.verify(&entry, b"secret").is_ok());
    }

    #[test]
    fn referral_policy_reads_ref_attribute() {
        let mut entry = Entry::new("cn=alice".into(), Dn::parse("cn=alice"));
        entry.add_value("objectClass", "referral".into());
        entry.add_value("ref", "ldap://other/dc=example,dc=com".into());
        let policy = SimpleReferralPolicy::default();
        assert!(policy.is_referral(&entry));
        assert_eq!(policy.referrals_of(&entry), vec!["ldap://other/dc=example,dc=com".to_string()]);
    }
}
