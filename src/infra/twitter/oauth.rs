//! OAuth 1.0a request signing (HMAC-SHA1, RFC 5849).

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac, digest::InvalidLength};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
use url::Url;
use uuid::Uuid;

type HmacSha1 = Hmac<Sha1>;

/// Characters outside the RFC 3986 unreserved set.
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Application and user secrets for the upstream service.
#[derive(Clone, PartialEq, Eq)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct OAuth1Signer {
    credentials: TwitterCredentials,
}

impl OAuth1Signer {
    pub fn new(credentials: TwitterCredentials) -> Self {
        Self { credentials }
    }

    /// Build the `Authorization` header value for a request with no body parameters.
    pub fn authorization_header(&self, method: &str, url: &Url) -> Result<String, InvalidLength> {
        let nonce = Uuid::new_v4().simple().to_string();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        self.header_with(method, url, &[], &nonce, timestamp)
    }

    fn header_with(
        &self,
        method: &str,
        url: &Url,
        body_params: &[(&str, &str)],
        nonce: &str,
        timestamp: u64,
    ) -> Result<String, InvalidLength> {
        let timestamp = timestamp.to_string();
        let mut oauth_params = vec![
            ("oauth_consumer_key", self.credentials.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", self.credentials.access_token.as_str()),
            ("oauth_version", OAUTH_VERSION),
        ];

        let signature = self.signature(method, url, &oauth_params, body_params)?;
        oauth_params.push(("oauth_signature", signature.as_str()));
        oauth_params.sort_by(|a, b| a.0.cmp(b.0));

        let fields = oauth_params
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {fields}"))
    }

    fn signature(
        &self,
        method: &str,
        url: &Url,
        oauth_params: &[(&str, &str)],
        body_params: &[(&str, &str)],
    ) -> Result<String, InvalidLength> {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| (encode(&key), encode(&value)))
            .chain(
                oauth_params
                    .iter()
                    .chain(body_params)
                    .map(|(key, value)| (encode(key), encode(value))),
            )
            .collect();
        params.sort();

        let param_string = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut base_url = url.clone();
        base_url.set_query(None);
        base_url.set_fragment(None);

        let base_string = format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            encode(base_url.as_str()),
            encode(&param_string)
        );
        let signing_key = format!(
            "{}&{}",
            encode(&self.credentials.consumer_secret),
            encode(&self.credentials.access_token_secret)
        );

        let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())?;
        mac.update(base_string.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, RFC3986).to_string()
}
