//! Viewport transform state, kept in its CSS-style string form.
//!
//! The chart surface carries one affine transform encoding translate plus
//! uniform scale, formatted as `matrix(a,b,c,d,e,f)` or `matrix3d(<16>)`.
//! The empty string means "never touched" and reads as identity. All
//! operations here parse, edit the relevant terms, and re-format; anything
//! they cannot parse they leave unchanged rather than corrupt.

/// Parsed transform terms.
#[derive(Debug, Clone, PartialEq)]
pub enum Matrix {
    /// `matrix(a, b, c, d, e, f)` — e/f translate, a/d scale.
    TwoD([f32; 6]),
    /// `matrix3d(<16 terms>)` — terms 12/13 translate, 0/5 scale.
    ThreeD([f32; 16]),
}

impl Matrix {
    /// Parse a transform string. Returns `None` for the empty string and for
    /// anything with the wrong shape or term count.
    pub fn parse(s: &str) -> Option<Matrix> {
        let (body, is_3d) = if let Some(rest) = s.strip_prefix("matrix3d(") {
            (rest.strip_suffix(')')?, true)
        } else if let Some(rest) = s.strip_prefix("matrix(") {
            (rest.strip_suffix(')')?, false)
        } else {
            return None;
        };
        let terms: Vec<f32> = body
            .split(',')
            .map(|t| t.trim().parse::<f32>())
            .collect::<Result<_, _>>()
            .ok()?;
        if is_3d {
            Some(Matrix::ThreeD(terms.try_into().ok()?))
        } else {
            Some(Matrix::TwoD(terms.try_into().ok()?))
        }
    }

    pub fn format(&self) -> String {
        let join = |terms: &[f32]| {
            terms
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        match self {
            Matrix::TwoD(t) => format!("matrix({})", join(t)),
            Matrix::ThreeD(t) => format!("matrix3d({})", join(t)),
        }
    }

    /// Current translate terms.
    pub fn translate(&self) -> (f32, f32) {
        match self {
            Matrix::TwoD(t) => (t[4], t[5]),
            Matrix::ThreeD(t) => (t[12], t[13]),
        }
    }

    /// Current uniform scale term.
    pub fn scale(&self) -> f32 {
        match self {
            Matrix::TwoD(t) => t[3],
            Matrix::ThreeD(t) => t[5],
        }
    }
}

/// Translate terms of a transform string; identity for anything unparsable.
pub fn translate_of(transform: &str) -> (f32, f32) {
    Matrix::parse(transform).map_or((0.0, 0.0), |m| m.translate())
}

/// Scale term of a transform string; 1 for anything unparsable.
pub fn scale_of(transform: &str) -> f32 {
    Matrix::parse(transform).map_or(1.0, |m| m.scale())
}

/// Gesture-start baseline: pointer page coordinates minus the current
/// translate. Subtracting this from later pointer positions yields the new
/// translate directly.
pub fn pan_baseline(transform: &str, page_x: f32, page_y: f32) -> (f32, f32) {
    let (tx, ty) = translate_of(transform);
    (page_x - tx, page_y - ty)
}

/// Write new translate terms, leaving scale untouched. The empty string
/// becomes a fresh identity-scale matrix carrying the translate.
pub fn apply_pan(transform: &str, new_x: f32, new_y: f32) -> String {
    if transform.is_empty() {
        return Matrix::TwoD([1.0, 0.0, 0.0, 1.0, new_x, new_y]).format();
    }
    match Matrix::parse(transform) {
        Some(Matrix::TwoD(mut t)) => {
            t[4] = new_x;
            t[5] = new_y;
            Matrix::TwoD(t).format()
        }
        Some(Matrix::ThreeD(mut t)) => {
            t[12] = new_x;
            t[13] = new_y;
            Matrix::ThreeD(t).format()
        }
        None => transform.to_owned(),
    }
}

/// Multiply the scale terms by `factor`, rejecting the update (string
/// unchanged) when the resulting absolute scale would leave the open
/// interval `(zoomout_limit, zoomin_limit)`. Translate terms never move.
pub fn apply_zoom(transform: &str, factor: f32, zoomout_limit: f32, zoomin_limit: f32) -> String {
    if transform.is_empty() {
        return Matrix::TwoD([factor, 0.0, 0.0, factor, 0.0, 0.0]).format();
    }
    match Matrix::parse(transform) {
        Some(Matrix::TwoD(mut t)) => {
            let target = (t[3] * factor).abs();
            if target > zoomout_limit && target < zoomin_limit {
                t[0] = target;
                t[3] = target;
                Matrix::TwoD(t).format()
            } else {
                transform.to_owned()
            }
        }
        Some(Matrix::ThreeD(mut t)) => {
            let target = (t[5] * factor).abs();
            if target > zoomout_limit && target < zoomin_limit {
                t[0] = target;
                t[5] = target;
                Matrix::ThreeD(t).format()
            } else {
                transform.to_owned()
            }
        }
        None => transform.to_owned(),
    }
}

/// Zero the translate terms, preserving scale and skew. 2-D transforms only;
/// anything else passes through unchanged.
pub fn recenter(transform: &str) -> String {
    match Matrix::parse(transform) {
        Some(Matrix::TwoD(mut t)) => {
            t[4] = 0.0;
            t[5] = 0.0;
            Matrix::TwoD(t).format()
        }
        _ => transform.to_owned(),
    }
}

/// Force the scale terms to 1, preserving translate. 2-D transforms only.
pub fn rescale(transform: &str) -> String {
    match Matrix::parse(transform) {
        Some(Matrix::TwoD(mut t)) => {
            t[0] = 1.0;
            t[3] = 1.0;
            Matrix::TwoD(t).format()
        }
        _ => transform.to_owned(),
    }
}

/// Recenter and rescale in one step. Callers wanting both must use this
/// rather than calling [`recenter`] and [`rescale`] back to back: the second
/// call would read state that may not yet reflect the first when the result
/// is round-tripped through asynchronous UI state.
pub fn recenter_and_rescale(transform: &str) -> String {
    match Matrix::parse(transform) {
        Some(Matrix::TwoD(mut t)) => {
            t[0] = 1.0;
            t[3] = 1.0;
            t[4] = 0.0;
            t[5] = 0.0;
            Matrix::TwoD(t).format()
        }
        _ => transform.to_owned(),
    }
}
