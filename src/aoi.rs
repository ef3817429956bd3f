use crate::error::FetchError;

/// Area-of-interest collaborator. The search only needs a point count and
/// two WKT renderings; anything fancier lives with the caller.
pub trait AreaOfInterest: Send + Sync {
    fn num_points(&self) -> usize;
    /// Exact polygon as `POLYGON((lon lat, ...))`.
    fn to_wkt(&self) -> String;
    /// Bounding-box approximation of the polygon, same WKT shape.
    fn to_wkt_bounds(&self) -> String;
}

/// Minimal lon/lat ring implementation used by the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<(f64, f64)>,
}

impl Polygon {
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, FetchError> {
        if !points.is_empty() && points.len() < 3 {
            return Err(FetchError::InvalidAoi(format!(
                "a polygon ring needs at least 3 points, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    fn ring(&self) -> Vec<(f64, f64)> {
        let mut ring = self.points.clone();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        ring
    }
}

impl AreaOfInterest for Polygon {
    fn num_points(&self) -> usize {
        self.points.len()
    }

    fn to_wkt(&self) -> String {
        let coords = self
            .ring()
            .iter()
            .map(|(lon, lat)| format!("{lon} {lat}"))
            .collect::<Vec<_>>()
            .join(",");
        format!("POLYGON(({coords}))")
    }

    fn to_wkt_bounds(&self) -> String {
        let mut min_lon = f64::INFINITY;
        let mut min_lat = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        for (lon, lat) in &self.points {
            min_lon = min_lon.min(*lon);
            max_lon = max_lon.max(*lon);
            min_lat = min_lat.min(*lat);
            max_lat = max_lat.max(*lat);
        }
        format!(
            "POLYGON(({min_lon} {min_lat},{max_lon} {min_lat},{max_lon} {max_lat},{min_lon} {max_lat},{min_lon} {min_lat}))"
        )
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn wkt_closes_the_ring() {
        let polygon = Polygon::new(vec![(10.0, 45.0), (11.0, 45.0), (11.0, 46.0)]).unwrap();
        let wkt = polygon.to_wkt();
        assert_eq!(wkt, "POLYGON((10 45,11 45,11 46,10 45))");
    }

    #[test]
    fn bounds_cover_all_points() {
        let polygon =
            Polygon::new(vec![(10.0, 45.0), (12.5, 44.0), (11.0, 47.0), (10.5, 45.5)]).unwrap();
        let bounds = polygon.to_wkt_bounds();
        assert_eq!(
            bounds,
            "POLYGON((10 44,12.5 44,12.5 47,10 47,10 44))"
        );
    }

    #[test]
    fn degenerate_ring_rejected() {
        let err = Polygon::new(vec![(10.0, 45.0), (11.0, 45.0)]).unwrap_err();
        assert_matches!(err, FetchError::InvalidAoi(_));
    }

    #[test]
    fn empty_polygon_has_no_points() {
        assert_eq!(Polygon::empty().num_points(), 0);
    }
}
