use std::borrow::Cow;

use chrono::{DateTime, Utc};
use tracing::debug;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;
use x509_parser::time::ASN1Time;

use super::errors::DecodeError;
use super::types::CrlFacts;

const PEM_PREFIX: &[u8] = b"-----BEGIN";

/// Extract `thisUpdate` and `nextUpdate` from a CRL.
///
/// Distribution points normally serve DER; PEM bodies are unwrapped first.
/// The signature is not verified.
pub fn decode_crl(data: &[u8]) -> Result<CrlFacts, DecodeError> {
    let der = unwrap_pem(data)?;

    let (_, crl) =
        CertificateRevocationList::from_der(&der).map_err(|e| DecodeError::Der(e.to_string()))?;

    let tbs = &crl.tbs_cert_list;
    let next_update = tbs
        .next_update
        .as_ref()
        .ok_or(DecodeError::MissingNextUpdate)?;

    Ok(CrlFacts {
        generation_time: to_utc(&tbs.this_update)?,
        expiration_time: to_utc(next_update)?,
    })
}

fn unwrap_pem(data: &[u8]) -> Result<Cow<'_, [u8]>, DecodeError> {
    if !data.trim_ascii_start().starts_with(PEM_PREFIX) {
        return Ok(Cow::Borrowed(data));
    }

    debug!("CRL body is PEM encoded");
    let (_, pem) = parse_x509_pem(data.trim_ascii_start())
        .map_err(|e| DecodeError::Der(format!("invalid PEM: {e}")))?;
    Ok(Cow::Owned(pem.contents))
}

fn to_utc(time: &ASN1Time) -> Result<DateTime<Utc>, DecodeError> {
    let seconds = time.timestamp();
    DateTime::from_timestamp(seconds, 0).ok_or(DecodeError::Timestamp(seconds))
}
