//! Stateless login captcha.
//!
//! The server hands out a digit code (as an image) together with
//! `vreal = base64url(HMAC-SHA1(key, code))`. The client echoes both back,
//! so nothing about outstanding challenges is stored server-side.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::Serialize;
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Digits in an issued code.
pub const CODE_LEN: usize = 4;

const WIDTH: u32 = 120;
const HEIGHT: u32 = 40;
const NOISE_LINES: usize = 8;

/// Signs a captcha code with the server key.
pub fn sign(code: &str, key: &str) -> String {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(code.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Checks a submitted `(code, vreal)` pair.
pub fn verify(code: &str, vreal: &str, key: &str) -> bool {
    let expected = sign(code, key);
    expected.as_bytes().ct_eq(vreal.as_bytes()).into()
}

/// A freshly issued challenge as sent to the client.
#[derive(Debug, Clone, Serialize)]
pub struct Captcha {
    /// `data:image/svg+xml;base64,...` rendering of the code.
    pub vcode: String,
    /// Signature the client must echo back.
    pub vreal: String,
}

impl Captcha {
    pub fn issue(key: &str) -> Self {
        let mut rng = rand::thread_rng();
        let code: String = (0..CODE_LEN)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self::for_code(&code, key)
    }

    pub fn for_code(code: &str, key: &str) -> Self {
        let svg = render_svg(code);
        Self {
            vcode: format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)),
            vreal: sign(code, key),
        }
    }
}

fn render_svg(text: &str) -> String {
    let mut rng = rand::thread_rng();

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}">"#
    );
    svg.push_str(r##"<rect width="100%" height="100%" fill="#f4f4f4"/>"##);

    for _ in 0..NOISE_LINES {
        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="rgb({},{},{})" stroke-width="1"/>"#,
            rng.gen_range(0..WIDTH),
            rng.gen_range(0..HEIGHT),
            rng.gen_range(0..WIDTH),
            rng.gen_range(0..HEIGHT),
            rng.gen_range(120..220),
            rng.gen_range(120..220),
            rng.gen_range(120..220),
        ));
    }

    let step = WIDTH as f32 / (text.len() as f32 + 1.0);
    for (i, c) in text.chars().enumerate() {
        let x = step * (i as f32 + 0.6);
        let y = 28 + rng.gen_range(-4..5);
        let rotation = rng.gen_range(-20..20);
        svg.push_str(&format!(
            r#"<text x="{x:.1}" y="{y}" font-family="monospace" font-size="24" font-weight="bold" fill="rgb({},{},{})" transform="rotate({rotation} {x:.1} {y})">{c}</text>"#,
            rng.gen_range(0..110),
            rng.gen_range(0..110),
            rng.gen_range(0..110),
        ));
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "v.c.o.d.e";

    #[test]
    fn signature_is_deterministic() {
        assert_eq!(sign("1234", KEY), sign("1234", KEY));
        assert_ne!(sign("1234", KEY), sign("1234", "other-key"));
    }

    #[test]
    fn signature_is_unpadded_url_safe_sha1() {
        let mac = sign("0000", KEY);
        // 20 bytes of SHA-1 → 27 base64 chars without padding
        assert_eq!(mac.len(), 27);
        assert!(!mac.contains('='));
        assert!(!mac.contains('+') && !mac.contains('/'));
    }

    #[test]
    fn verify_accepts_matching_pair() {
        let vreal = sign("4821", KEY);
        assert!(verify("4821", &vreal, KEY));
    }

    #[test]
    fn verify_rejects_altered_code_or_mac() {
        let vreal = sign("4821", KEY);
        assert!(!verify("4822", &vreal, KEY));

        let mut altered: Vec<char> = vreal.chars().collect();
        altered[0] = if altered[0] == 'A' { 'B' } else { 'A' };
        let altered: String = altered.into_iter().collect();
        assert!(!verify("4821", &altered, KEY));
        assert!(!verify("4821", "", KEY));
    }

    fn decode_svg(captcha: &Captcha) -> String {
        let encoded = captcha
            .vcode
            .strip_prefix("data:image/svg+xml;base64,")
            .unwrap();
        String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap()
    }

    #[test]
    fn issued_captcha_is_four_digits_and_self_consistent() {
        let captcha = Captcha::issue(KEY);
        let svg = decode_svg(&captcha);
        let code: String = svg
            .split("</text>")
            .filter_map(|chunk| chunk.chars().last())
            .filter(char::is_ascii_digit)
            .collect();
        assert_eq!(code.len(), CODE_LEN);
        assert!(verify(&code, &captcha.vreal, KEY));
    }

    #[test]
    fn rendering_contains_every_digit() {
        let svg = decode_svg(&Captcha::for_code("5093", KEY));
        for digit in ["5", "0", "9", "3"] {
            assert!(svg.contains(&format!(">{digit}</text>")));
        }
    }

    #[test]
    fn serialized_captcha_hides_code() {
        let captcha = Captcha::for_code("1111", KEY);
        let json = serde_json::to_value(&captcha).unwrap();
        assert!(json.get("code").is_none());
        assert_eq!(json["vreal"], sign("1111", KEY));
    }
}
