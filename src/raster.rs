//! Integer rasterisation.
//!
//! Both iterators work in signed coordinates and know nothing about the
//! panel; the caller decides what to do with points that fall off it.

/// Points of a Bresenham line, inclusive of both endpoints.
///
/// The axis with the larger delta drives the iteration (x wins ties) and the
/// endpoints are swapped so the driving coordinate always ascends. A line and
/// its reverse therefore produce the same sequence.
#[derive(Clone, Debug)]
pub struct Line {
    // driving and secondary coordinate, swapped back on output when steep
    major: i16,
    minor: i16,
    major_end: i16,
    minor_step: i16,
    d: i32,
    a_incr: i32,
    b_incr: i32,
    steep: bool,
    started: bool,
}

impl Line {
    pub fn new(start: (i16, i16), end: (i16, i16)) -> Self {
        let (mut x0, mut y0) = start;
        let (mut x1, mut y1) = end;

        let dx = (i32::from(x1) - i32::from(x0)).abs();
        let dy = (i32::from(y1) - i32::from(y0)).abs();
        let steep = dy > dx;

        if steep {
            core::mem::swap(&mut x0, &mut y0);
            core::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            core::mem::swap(&mut x0, &mut x1);
            core::mem::swap(&mut y0, &mut y1);
        }

        let (d_major, d_minor) = if steep { (dy, dx) } else { (dx, dy) };

        Line {
            major: x0,
            minor: y0,
            major_end: x1,
            minor_step: if y1 > y0 { 1 } else { -1 },
            d: 2 * d_minor - d_major,
            a_incr: 2 * (d_minor - d_major),
            b_incr: 2 * d_minor,
            steep,
            started: false,
        }
    }

    fn point(&self) -> (i16, i16) {
        if self.steep {
            (self.minor, self.major)
        } else {
            (self.major, self.minor)
        }
    }
}

impl Iterator for Line {
    type Item = (i16, i16);

    fn next(&mut self) -> Option<(i16, i16)> {
        if !self.started {
            self.started = true;
            return Some(self.point());
        }
        if self.major >= self.major_end {
            return None;
        }

        self.major += 1;
        if self.d >= 0 {
            self.minor += self.minor_step;
            self.d += self.a_incr;
        } else {
            self.d += self.b_incr;
        }
        Some(self.point())
    }
}

/// Points of a midpoint circle.
///
/// Emits the four axis extremes first, then eight mirrored points per step
/// of the first-octant walk. Points on the diagonals and axes may be emitted
/// more than once.
#[derive(Clone, Debug)]
pub struct Circle {
    cx: i16,
    cy: i16,
    f: i32,
    ddf_x: i32,
    ddf_y: i32,
    x: i16,
    y: i16,
    pending: [(i16, i16); 8],
    len: usize,
    idx: usize,
}

impl Circle {
    pub fn new(center: (i16, i16), radius: i16) -> Self {
        let (cx, cy) = center;
        let r = radius;
        let mut pending = [(0, 0); 8];
        pending[0] = (cx, cy + r);
        pending[1] = (cx, cy - r);
        pending[2] = (cx + r, cy);
        pending[3] = (cx - r, cy);

        Circle {
            cx,
            cy,
            f: 1 - i32::from(r),
            ddf_x: 0,
            ddf_y: -2 * i32::from(r),
            x: 0,
            y: r,
            pending,
            len: 4,
            idx: 0,
        }
    }

    fn step(&mut self) {
        if self.f >= 0 {
            self.y -= 1;
            self.ddf_y += 2;
            self.f += self.ddf_y;
        }
        self.x += 1;
        self.ddf_x += 2;
        self.f += self.ddf_x + 1;

        let (cx, cy, x, y) = (self.cx, self.cy, self.x, self.y);
        self.pending = [
            (cx + x, cy + y),
            (cx - x, cy + y),
            (cx + x, cy - y),
            (cx - x, cy - y),
            (cx + y, cy + x),
            (cx - y, cy + x),
            (cx + y, cy - x),
            (cx - y, cy - x),
        ];
        self.len = 8;
        self.idx = 0;
    }
}

impl Iterator for Circle {
    type Item = (i16, i16);

    fn next(&mut self) -> Option<(i16, i16)> {
        if self.idx >= self.len {
            if self.x >= self.y {
                return None;
            }
            self.step();
        }
        let p = self.pending[self.idx];
        self.idx += 1;
        Some(p)
    }
}
