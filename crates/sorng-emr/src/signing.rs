//! AWS Signature Version 2 for Query-protocol requests.
//!
//! EMR's Query API authenticates a POST body by signing a canonical form of
//! the request parameters:
//!
//! 1. Add `AWSAccessKeyId`, `Timestamp`, `SignatureVersion=2` and
//!    `SignatureMethod=HmacSHA256`.
//! 2. Escape every key and value (see [`aws_escape`]).
//! 3. Sort by escaped key and join as `k=v` pairs with `&`.
//! 4. Sign `POST\n{host}\n/\n{canonical query}` with HMAC-SHA256.
//! 5. Append `&Signature={escaped base64 digest}` to form the body.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;

use crate::params::FlatParams;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_VERSION: &str = "2";
pub const SIGNATURE_METHOD: &str = "HmacSHA256";

/// Everything outside `[A-Za-z0-9._~-]` is escaped.
const AWS_ESCAPE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'-');

/// Escape a key or value: each UTF-8 byte outside `[A-Za-z0-9._~-]` becomes `%XX`
/// (uppercase hex). Note that unlike form encoding a space is `%20`, never `+`.
pub fn aws_escape(input: &str) -> String {
    utf8_percent_encode(input, AWS_ESCAPE_SET).to_string()
}

/// Escape all pairs, sort by escaped key and join with `&`.
pub fn canonical_query_string(params: &FlatParams) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (aws_escape(k), aws_escape(v)))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<String>>()
        .join("&")
}

/// `POST\n{lowercased host}\n/\n{canonical query}`.
pub fn string_to_sign(host: &str, canonical_query: &str) -> String {
    format!("POST\n{}\n/\n{}", host.to_lowercase(), canonical_query)
}

/// Base64 HMAC-SHA256 of `data` keyed by `secret` (unescaped).
pub fn hmac_sha256_base64(secret: &str, data: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    BASE64.encode(mac.finalize().into_bytes()).trim_end().to_string()
}

/// Timestamp in the `YYYY-MM-DDThh:mm:ss.000Z` form the service expects.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S.000Z").to_string()
}

/// AWS SigV2 signer bound to one key pair and endpoint host.
#[derive(Clone)]
pub struct SigV2Signer {
    pub access_key_id: String,
    secret_access_key: String,
    pub host: String,
}

/// The result of signing a parameter set.
#[derive(Debug, Clone)]
pub struct SignedQuery {
    /// Input parameters plus the authentication entries and `Signature`.
    pub params: FlatParams,
    /// The canonical query string that was signed.
    pub canonical_query: String,
    /// Raw base64 signature.
    pub signature: String,
    /// Final request body: canonical query plus the escaped signature.
    pub body: String,
}

impl SigV2Signer {
    pub fn new(access_key_id: &str, secret_access_key: &str, host: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            host: host.to_string(),
        }
    }

    /// Sign `params` at `timestamp`.
    pub fn sign_params(&self, params: &FlatParams, timestamp: DateTime<Utc>) -> SignedQuery {
        let mut signed = params.clone();
        signed.insert("AWSAccessKeyId".to_string(), self.access_key_id.clone());
        signed.insert("Timestamp".to_string(), format_timestamp(timestamp));
        signed.insert("SignatureVersion".to_string(), SIGNATURE_VERSION.to_string());
        signed.insert("SignatureMethod".to_string(), SIGNATURE_METHOD.to_string());

        let canonical_query = canonical_query_string(&signed);
        let to_sign = string_to_sign(&self.host, &canonical_query);
        let signature = hmac_sha256_base64(&self.secret_access_key, &to_sign);
        let body = format!("{}&Signature={}", canonical_query, aws_escape(&signature));

        signed.insert("Signature".to_string(), signature.clone());
        SignedQuery {
            params: signed,
            canonical_query,
            signature,
            body,
        }
    }
}

impl std::fmt::Debug for SigV2Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigV2Signer")
            .field("access_key_id", &self.access_key_id)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap()
    }

    fn test_signer() -> SigV2Signer {
        SigV2Signer::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "elasticmapreduce.us-east-1.amazonaws.com",
        )
    }

    #[test]
    fn escape_space() {
        assert_eq!(aws_escape("foo bar"), "foo%20bar");
    }

    #[test]
    fn escape_leaves_unreserved_alone() {
        assert_eq!(aws_escape("abcXYZ019._~-"), "abcXYZ019._~-");
    }

    #[test]
    fn escape_reserved_and_percent() {
        assert_eq!(aws_escape("a+b/c=d"), "a%2Bb%2Fc%3Dd");
        assert_eq!(aws_escape("%"), "%25");
        assert_eq!(aws_escape("*"), "%2A");
        assert_eq!(aws_escape("2014-01-01T00:00:00.000Z"), "2014-01-01T00%3A00%3A00.000Z");
    }

    #[test]
    fn escape_multibyte_uses_each_byte() {
        assert_eq!(aws_escape("héllo"), "h%C3%A9llo");
    }

    #[test]
    fn canonical_query_sorted_regardless_of_insertion() {
        let mut a = FlatParams::new();
        a.insert("Zeta".into(), "1".into());
        a.insert("Alpha".into(), "2".into());
        a.insert("Mid Key".into(), "3".into());
        let mut b = FlatParams::new();
        b.insert("Mid Key".into(), "3".into());
        b.insert("Alpha".into(), "2".into());
        b.insert("Zeta".into(), "1".into());
        assert_eq!(canonical_query_string(&a), "Alpha=2&Mid%20Key=3&Zeta=1");
        assert_eq!(canonical_query_string(&a), canonical_query_string(&b));
    }

    #[test]
    fn string_to_sign_lowercases_host() {
        assert_eq!(
            string_to_sign("ElasticMapReduce.US-EAST-1.amazonaws.com", "A=1"),
            "POST\nelasticmapreduce.us-east-1.amazonaws.com\n/\nA=1"
        );
    }

    #[test]
    fn hmac_known_vector() {
        // RFC 4231 test case 2.
        assert_eq!(
            hmac_sha256_base64("Jefe", "what do ya want for nothing?"),
            "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM="
        );
    }

    #[test]
    fn timestamp_format() {
        assert_eq!(format_timestamp(fixed_time()), "2014-01-01T00:00:00.000Z");
    }

    #[test]
    fn sign_params_adds_auth_entries() {
        let mut params = FlatParams::new();
        params.insert("Operation".into(), "DescribeJobFlows".into());
        let signed = test_signer().sign_params(&params, fixed_time());
        assert_eq!(signed.params["AWSAccessKeyId"], "AKIDEXAMPLE");
        assert_eq!(signed.params["Timestamp"], "2014-01-01T00:00:00.000Z");
        assert_eq!(signed.params["SignatureVersion"], "2");
        assert_eq!(signed.params["SignatureMethod"], "HmacSHA256");
        assert_eq!(signed.params["Signature"], signed.signature);
    }

    #[test]
    fn sign_params_reference_body() {
        let mut params = FlatParams::new();
        params.insert("Operation".into(), "DescribeJobFlows".into());
        params.insert("JobFlowIds.member.1".into(), "j-1".into());
        let signed = test_signer().sign_params(&params, fixed_time());

        assert_eq!(
            signed.canonical_query,
            "AWSAccessKeyId=AKIDEXAMPLE&JobFlowIds.member.1=j-1&Operation=DescribeJobFlows\
             &SignatureMethod=HmacSHA256&SignatureVersion=2\
             &Timestamp=2014-01-01T00%3A00%3A00.000Z"
        );
        assert_eq!(signed.signature, "WLFRgV3vt/LV2BsR1Red+PPmFvPvvTMsP/hseMmDeSg=");
        assert_eq!(
            signed.body,
            format!(
                "{}&Signature=WLFRgV3vt%2FLV2BsR1Red%2BPPmFvPvvTMsP%2FhseMmDeSg%3D",
                signed.canonical_query
            )
        );
    }

    #[test]
    fn signing_is_deterministic() {
        let mut params = FlatParams::new();
        params.insert("Operation".into(), "TerminateJobFlows".into());
        let a = test_signer().sign_params(&params, fixed_time());
        let b = test_signer().sign_params(&params, fixed_time());
        assert_eq!(a.body, b.body);
    }

    #[test]
    fn debug_hides_secret() {
        let dbg = format!("{:?}", test_signer());
        assert!(!dbg.contains("EXAMPLEKEY"));
    }
}
