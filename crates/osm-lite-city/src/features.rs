// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-building feature records
//!
//! These rows feed the external height regression: one line per building,
//! comma separated, in the column order of [`CSV_HEADER`].

use osm_lite_model::ElementId;
use serde::Serialize;

/// Column names of [`BuildingFeatures::to_csv_row`]
pub const CSV_HEADER: &str = "id,area,perimeter,index,floors,nis,neighbors,length,width,type,height";

/// Scalar description of one building
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BuildingFeatures {
    pub id: ElementId,
    /// Ground area
    pub area: f64,
    pub perimeter: f64,
    /// Compactness index
    pub index: f64,
    pub floors: i32,
    /// Net internal surface
    pub nis: f64,
    pub neighbors: usize,
    pub length: f64,
    pub width: f64,
    #[serde(rename = "type")]
    pub building_type: String,
    pub height: f64,
}

impl BuildingFeatures {
    /// Fields joined with `,`
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{}",
            self.id,
            self.area,
            self.perimeter,
            self.index,
            self.floors,
            self.nis,
            self.neighbors,
            self.length,
            self.width,
            self.building_type,
            self.height
        )
    }
}

/// Header line followed by one row per record
pub fn to_csv(features: &[BuildingFeatures]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for row in features {
        out.push_str(&row.to_csv_row());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BuildingFeatures {
        BuildingFeatures {
            id: 42,
            area: 96.0,
            perimeter: 40.0,
            index: 0.5,
            floors: 2,
            nis: 192.0,
            neighbors: 3,
            length: 12.0,
            width: 8.0,
            building_type: "house".to_string(),
            height: 6.5,
        }
    }

    #[test]
    fn test_csv_row() {
        assert_eq!(sample().to_csv_row(), "42,96,40,0.5,2,192,3,12,8,house,6.5");
        assert_eq!(
            sample().to_csv_row().split(',').count(),
            CSV_HEADER.split(',').count()
        );
    }

    #[test]
    fn test_csv_document() {
        let csv = to_csv(&[sample(), sample()]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
    }

    #[test]
    fn test_json_uses_type_key() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["type"], "house");
        assert_eq!(json["nis"], 192.0);
        assert!(json.get("building_type").is_none());
    }
}
