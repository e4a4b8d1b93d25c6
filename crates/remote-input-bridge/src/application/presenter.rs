//! Ports the dialog bridge needs from the host: a presenter and a QR encoder.
//!
//! Neither the dialog's visual layout nor QR rendering belongs to the bridge.
//! The host supplies a [`DialogPresenter`] that draws the dialog and wires its
//! buttons to a [`DialogHandle`](super::dialog_bridge::DialogHandle), and a
//! [`QrEncoder`] that turns the discovery URL into a module matrix.

use thiserror::Error;

use super::dialog_bridge::DialogHandle;

/// Shows an opened dialog.  Called on the UI context.
pub trait DialogPresenter: Send + Sync {
    /// Displays the dialog described by `dialog.snapshot()`.
    ///
    /// The presenter forwards local button presses and edits to `dialog`
    /// and may watch `dialog.subscribe()` to redraw on remote edits.
    /// `remote` is `None` when the bridge server is unavailable.
    fn show(&self, dialog: DialogHandle, remote: Option<RemoteAccess>);
}

/// What the dialog shows so a second device can connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAccess {
    /// The `http://{hostIp}:{port}` discovery payload.
    pub url: String,
    /// The QR code for `url`, if an encoder is configured and succeeded.
    pub qr: Option<QrMatrix>,
}

/// Error from a [`QrEncoder`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("QR encoding failed: {0}")]
pub struct QrError(pub String);

/// External capability: `encode(text, size) -> matrix`.
pub trait QrEncoder: Send + Sync {
    /// Encodes `text` as a square matrix roughly `size` cells per side.
    ///
    /// # Errors
    ///
    /// Returns [`QrError`] if `text` does not fit in a QR code.
    fn encode(&self, text: &str, size: u32) -> Result<QrMatrix, QrError>;
}

/// A square matrix of dark (`true`) / light (`false`) cells, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct QrMatrix {
    side: usize,
    cells: Vec<bool>,
}

impl QrMatrix {
    /// Builds a `side` × `side` matrix from `dark(x, y)`.
    pub fn from_fn(side: usize, mut dark: impl FnMut(usize, usize) -> bool) -> Self {
        let mut cells = Vec::with_capacity(side * side);
        for y in 0..side {
            for x in 0..side {
                cells.push(dark(x, y));
            }
        }
        Self { side, cells }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// `true` if the cell is dark; out-of-range cells are light.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.side && y < self.side && self.cells[y * self.side + x]
    }

    /// Renders two matrix rows per line with Unicode half blocks, so the code
    /// keeps a square aspect ratio in a terminal.
    pub fn to_half_block_lines(&self) -> Vec<String> {
        (0..self.side.div_ceil(2))
            .map(|row| {
                let (upper_y, lower_y) = (row * 2, row * 2 + 1);
                (0..self.side)
                    .map(|x| match (self.get(x, upper_y), self.get(x, lower_y)) {
                        (true, true) => '█',
                        (true, false) => '▀',
                        (false, true) => '▄',
                        (false, false) => ' ',
                    })
                    .collect()
            })
            .collect()
    }
}

impl std::fmt::Debug for QrMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrMatrix").field("side", &self.side).finish()
    }
}
