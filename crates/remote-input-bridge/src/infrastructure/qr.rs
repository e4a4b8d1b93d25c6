//! [`QrEncoder`] backed by the `qrcodegen` crate.

use qrcodegen::{QrCode, QrCodeEcc};

use crate::application::{QrEncoder, QrError, QrMatrix};

/// Light modules kept around the symbol so scanners can find it.
const QUIET_ZONE: usize = 4;

/// Encodes text with `qrcodegen` and scales it to the requested size.
#[derive(Debug, Clone, Copy)]
pub struct QrCodeGenEncoder {
    ecc: QrCodeEcc,
}

impl QrCodeGenEncoder {
    pub fn new(ecc: QrCodeEcc) -> Self {
        Self { ecc }
    }
}

impl Default for QrCodeGenEncoder {
    fn default() -> Self {
        Self::new(QrCodeEcc::Medium)
    }
}

impl QrEncoder for QrCodeGenEncoder {
    /// Each module becomes a `scale` × `scale` block, where `scale` is the
    /// largest whole factor that fits in `size` (never less than 1).
    fn encode(&self, text: &str, size: u32) -> Result<QrMatrix, QrError> {
        let code = QrCode::encode_text(text, self.ecc).map_err(|e| QrError(e.to_string()))?;
        let modules = usize::try_from(code.size()).map_err(|e| QrError(e.to_string()))?;
        let total = modules + 2 * QUIET_ZONE;
        let scale = (size as usize / total).max(1);

        Ok(QrMatrix::from_fn(total * scale, |x, y| {
            let (mx, my) = (x / scale, y / scale);
            let inside = (QUIET_ZONE..QUIET_ZONE + modules).contains(&mx)
                && (QUIET_ZONE..QUIET_ZONE + modules).contains(&my);
            // In range by the check above, so the casts cannot truncate.
            inside && code.get_module((mx - QUIET_ZONE) as i32, (my - QUIET_ZONE) as i32)
        }))
    }
}
