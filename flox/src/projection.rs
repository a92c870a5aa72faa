use crate::model::Point;

/// Geographic-to-planar projection supplied by the host map.
pub trait Projector {
    fn project(&self, lat: f64, lng: f64) -> Point;
}

impl<F> Projector for F
where
    F: Fn(f64, f64) -> Point,
{
    fn project(&self, lat: f64, lng: f64) -> Point {
        self(lat, lng)
    }
}
