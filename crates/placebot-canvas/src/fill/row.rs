use super::PositionSequence;

/// Raster-order scan, or the exact reverse when `inverted`.
#[derive(Debug, Clone, Default)]
pub struct RowFill {
    inverted: bool,
    width: usize,
    height: usize,
    emitted: usize,
}

impl RowFill {
    pub fn new(inverted: bool) -> Self {
        Self {
            inverted,
            ..Self::default()
        }
    }
}

impl PositionSequence for RowFill {
    fn reset(&mut self, width: usize, height: usize) {
        *self = Self {
            inverted: self.inverted,
            width,
            height,
            emitted: 0,
        };
    }

    fn next(&mut self) -> Option<(usize, usize)> {
        let total = self.width * self.height;
        if self.emitted >= total {
            return None;
        }

        let i = if self.inverted {
            total - 1 - self.emitted
        } else {
            self.emitted
        };
        self.emitted += 1;

        Some((i % self.width, i / self.width))
    }
}
