use super::PositionSequence;

/// Outward square spiral around the middle of the box.
///
/// The walk is centered on `(width / 2 - 1, height / 2 - 1)`. Steps that
/// land outside the box are skipped but still count against the step
/// budget of `(max(width, height) + 1)^2`, which is exactly enough for the
/// off-center spiral to reach every edge cell.
#[derive(Debug, Clone, Default)]
pub struct SpiralFill {
    width: i64,
    height: i64,
    center: (i64, i64),
    pos: (i64, i64),
    dir: (i64, i64),
    steps_left: u64,
}

impl SpiralFill {
    pub fn new() -> Self {
        Self::default()
    }

    fn in_box(&self, x: i64, y: i64) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }
}

impl PositionSequence for SpiralFill {
    fn reset(&mut self, width: usize, height: usize) {
        let (width, height) = (width as i64, height as i64);
        let side = width.max(height) as u64 + 1;
        let steps = if width == 0 || height == 0 { 0 } else { side * side };

        *self = Self {
            width,
            height,
            center: (width / 2, height / 2),
            pos: (0, 0),
            dir: (0, -1),
            steps_left: steps,
        };
    }

    fn next(&mut self) -> Option<(usize, usize)> {
        while self.steps_left > 0 {
            self.steps_left -= 1;

            let (x, y) = self.pos;
            let (cell_x, cell_y) = (self.center.0 + x - 1, self.center.1 + y - 1);

            if x == y || (x < 0 && x == -y) || (x > 0 && x == 1 - y) {
                let (dx, dy) = self.dir;
                self.dir = (-dy, dx);
            }
            self.pos = (x + self.dir.0, y + self.dir.1);

            if self.in_box(cell_x, cell_y) {
                return Some((cell_x as usize, cell_y as usize));
            }
        }
        None
    }
}
