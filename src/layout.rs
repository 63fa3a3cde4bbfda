use rectpack::PackingResult;
use serde::{Deserialize, Serialize};

/// The finished layout of a sheet, written out as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,
    pub width: u32,
    pub height: u32,

    /// Fraction of the sheet covered by rects, from 0 to 1.
    pub occupancy: f64,

    pub rects: Vec<LayoutRect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRect {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,

    /// Whether the rect was turned 90 degrees to fit.
    pub rotated: bool,
}

impl Layout {
    /// Builds a layout from a packing whose payloads index into `names`.
    pub fn from_result(name: &str, names: &[String], result: &PackingResult<usize>) -> Self {
        let rects = result
            .items
            .iter()
            .map(|item| {
                let (x, y) = item.position();
                let (width, height) = item.size();

                LayoutRect {
                    name: names[item.payload].clone(),
                    x,
                    y,
                    width,
                    height,
                    rotated: item.rotated,
                }
            })
            .collect();

        Self {
            name: name.to_owned(),
            width: result.width,
            height: result.height,
            occupancy: result.occupancy(),
            rects,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use rectpack::{Item, Rect};

    #[test]
    fn from_result() {
        let names = vec!["wide".to_owned(), "tall".to_owned()];
        let mut tall = Item::from_rect(Rect::new(20, 0, 30, 20), 1);
        tall.rotated = true;

        let result = PackingResult::new(
            30,
            20,
            vec![Item::from_rect(Rect::new(0, 0, 20, 10), 0), tall],
        );

        let layout = Layout::from_result("sheet", &names, &result);

        assert_eq!(layout.name, "sheet");
        assert_eq!((layout.width, layout.height), (30, 20));
        assert!((layout.occupancy - 400.0 / 600.0).abs() < 1e-9);
        assert_eq!(
            layout.rects,
            vec![
                LayoutRect {
                    name: "wide".to_owned(),
                    x: 0,
                    y: 0,
                    width: 20,
                    height: 10,
                    rotated: false,
                },
                LayoutRect {
                    name: "tall".to_owned(),
                    x: 20,
                    y: 0,
                    width: 10,
                    height: 20,
                    rotated: true,
                },
            ]
        );
    }

    #[test]
    fn json_shape() {
        let result = PackingResult::new(4, 4, vec![Item::new((4, 4), 0)]);
        let layout = Layout::from_result("one", &["only".to_owned()], &result);

        let json = serde_json::to_value(&layout).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "name": "one",
                "width": 4,
                "height": 4,
                "occupancy": 1.0,
                "rects": [
                    { "name": "only", "x": 0, "y": 0, "width": 4, "height": 4, "rotated": false },
                ],
            })
        );
    }
}
