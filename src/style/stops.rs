//! Zoom-stopped style values.

use serde::Deserialize;
use serde::de::{Deserializer, Error as _};
use smallvec::SmallVec;

use crate::Error;

/// Non-empty list of `(zoom, value)` stops sorted by ascending zoom.
///
/// Evaluation uses interval semantics only: the lower bound of the
/// bracketing interval wins, values below the first stop return the
/// first value and values above the last stop return the last. There is
/// deliberately no exponential or categorical interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct Stops<T> {
    stops: SmallVec<[(f32, T); 8]>,
}

impl<T: Clone> Stops<T> {
    pub fn new(stops: impl IntoIterator<Item = (f32, T)>) -> Result<Self, Error> {
        let mut stops: SmallVec<[(f32, T); 8]> = stops.into_iter().collect();
        if stops.is_empty() {
            return Err(Error::EmptyStops);
        }
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Stops { stops })
    }

    /// Pure, deterministic and monotonic in `zoom`.
    pub fn evaluate(&self, zoom: f32) -> T {
        if zoom < self.stops[0].0 {
            return self.stops[0].1.clone();
        }

        let mut last = &self.stops[0];
        for next in &self.stops[1..] {
            if zoom == next.0 {
                return next.1.clone();
            }
            if last.0 <= zoom && zoom < next.0 {
                return last.1.clone();
            }
            last = next;
        }

        last.1.clone()
    }
}

/// A style property: a constant or a zoom-stopped function.
///
/// Constants resolve trivially; stopped values are re-evaluated at every
/// draw since zoom changes continuously. Both paths are observably
/// identical for a fixed zoom.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleProp<T> {
    Constant(T),
    Stopped(Stops<T>),
}

impl<T: Clone> StyleProp<T> {
    pub fn resolve(&self, zoom: f32) -> T {
        match self {
            StyleProp::Constant(value) => value.clone(),
            StyleProp::Stopped(stops) => stops.evaluate(zoom),
        }
    }
}

impl<T> From<T> for StyleProp<T> {
    fn from(value: T) -> Self {
        StyleProp::Constant(value)
    }
}

impl<'de, T> Deserialize<'de> for StyleProp<T>
where
    T: Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Matches the style-JSON fragment: either a plain value or a
        // function object. `base` is accepted but ignored since only
        // interval semantics are supported.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Function {
                #[serde(default)]
                base: Option<f32>,
                stops: Vec<(f32, T)>,
            },
            Constant(T),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Function { stops, base: _ } => {
                let stops = Stops::new(stops).map_err(D::Error::custom)?;
                Ok(StyleProp::Stopped(stops))
            }
            Repr::Constant(value) => Ok(StyleProp::Constant(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_boundaries() {
        let stops = Stops::new([(0.0, "a"), (10.0, "b"), (20.0, "c")]).unwrap();

        assert_eq!(stops.evaluate(-5.0), "a");
        assert_eq!(stops.evaluate(0.0), "a");
        assert_eq!(stops.evaluate(5.0), "a");
        assert_eq!(stops.evaluate(10.0), "b");
        assert_eq!(stops.evaluate(15.0), "b");
        assert_eq!(stops.evaluate(20.0), "c");
        assert_eq!(stops.evaluate(100.0), "c");
    }

    #[test]
    fn single_stop_is_constant() {
        let stops = Stops::new([(14.0, 2.5f32)]).unwrap();
        assert_eq!(stops.evaluate(0.0), 2.5);
        assert_eq!(stops.evaluate(22.0), 2.5);
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let stops = Stops::new([(12.0, 2), (4.0, 1)]).unwrap();
        assert_eq!(stops.evaluate(5.0), 1);
        assert_eq!(stops.evaluate(12.0), 2);
    }

    #[test]
    fn empty_stops_fail_at_construction() {
        assert!(matches!(
            Stops::<f32>::new([]),
            Err(crate::Error::EmptyStops)
        ));
    }

    #[test]
    fn deserialize_constant_and_function() {
        let prop: StyleProp<f32> = serde_json::from_value(serde_json::json!(3.5)).unwrap();
        assert_eq!(prop.resolve(10.0), 3.5);

        let prop: StyleProp<f32> =
            serde_json::from_value(serde_json::json!({"base": 1.8, "stops": [[5, 1.0], [10, 4.0]]}))
                .unwrap();
        assert_eq!(prop.resolve(4.0), 1.0);
        // Interval semantics: no interpolation between stops.
        assert_eq!(prop.resolve(9.5), 1.0);
        assert_eq!(prop.resolve(10.0), 4.0);

        let empty: Result<StyleProp<f32>, _> =
            serde_json::from_value(serde_json::json!({"stops": []}));
        assert!(empty.is_err());
    }
}
