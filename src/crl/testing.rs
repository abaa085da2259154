//! Builders for minimal, unsigned CRLs used across unit tests.

use std::path::Path;

use base64::Engine as _;
use chrono::DateTime;

// sha256WithRSAEncryption
const SIGNATURE_ALGORITHM_OID: [u8; 9] = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b];

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.extend([0x81, len as u8]);
    } else {
        out.extend([0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(content);
    out
}

fn utc_time(timestamp: i64) -> Vec<u8> {
    let time = DateTime::from_timestamp(timestamp, 0).unwrap();
    tlv(0x17, time.format("%y%m%d%H%M%SZ").to_string().as_bytes())
}

/// DER encoded v2 CRL with the given `thisUpdate` and optional `nextUpdate`.
pub fn crl_der(this_update: i64, next_update: Option<i64>) -> Vec<u8> {
    let algorithm = tlv(0x30, &[tlv(0x06, &SIGNATURE_ALGORITHM_OID), vec![0x05, 0x00]].concat());
    let common_name = tlv(
        0x30,
        &[tlv(0x06, &[0x55, 0x04, 0x03]), tlv(0x0c, b"Test CA")].concat(),
    );
    let issuer = tlv(0x30, &tlv(0x31, &common_name));

    let mut tbs = [tlv(0x02, &[0x01]), algorithm.clone(), issuer, utc_time(this_update)].concat();
    if let Some(next_update) = next_update {
        tbs.extend(utc_time(next_update));
    }

    tlv(
        0x30,
        &[tlv(0x30, &tbs), algorithm, tlv(0x03, &[0x00, 0x00])].concat(),
    )
}

pub fn crl_pem(der: &[u8]) -> Vec<u8> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(der);
    let mut pem = String::from("-----BEGIN X509 CRL-----\n");
    for line in encoded.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(line).unwrap());
        pem.push('\n');
    }
    pem.push_str("-----END X509 CRL-----\n");
    pem.into_bytes()
}

pub fn write_config(path: &Path, urls: &[&str]) {
    if urls.is_empty() {
        std::fs::write(path, "crls: []\n").unwrap();
        return;
    }
    let mut document = String::from("crls:\n");
    for url in urls {
        document.push_str(&format!("  - \"{url}\"\n"));
    }
    std::fs::write(path, document).unwrap();
}
