use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde::Serialize;

use crate::error::Result;

const QR_MIN_SIZE: u32 = 200;

/// Where a customer's phone lands after scanning the counter QR code or
/// tapping the NFC tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StampLinks {
    pub stamp_url: String,
    pub nfc_url: String,
}

impl StampLinks {
    #[must_use]
    pub fn new(stamp_base_url: &str, nfc_base_url: &str, cafe_id: &str) -> Self {
        Self {
            stamp_url: join(stamp_base_url, cafe_id),
            nfc_url: join(nfc_base_url, cafe_id),
        }
    }
}

fn join(base: &str, cafe_id: &str) -> String {
    format!("{}/{cafe_id}", base.trim_end_matches('/'))
}

/// Renders `data` as an SVG QR code with high error correction, so a
/// printed code survives coffee stains.
pub fn render_qr_svg(data: &str) -> Result<String> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::H)?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .quiet_zone(true)
        .build())
}

/// Download name for a cafe's QR code. Path separators and other characters
/// that are unsafe in file names become `-`.
#[must_use]
pub fn qr_filename(cafe_name: &str) -> String {
    let cleaned: String = cafe_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    let name = cleaned.trim();
    let name = if name.chars().all(|c| c == '.') { "cafe" } else { name };
    format!("{name}-qr-code.svg")
}
