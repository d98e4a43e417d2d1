use super::geojson::{FeatureCollection, GeoFeature};
use super::Result;
use serde_json::to_string;
use std::io::Write;

pub trait Output {
    fn write_geojson(&self, writer: &mut dyn Write) -> Result<()>;
    fn write_json_lines(&self, writer: &mut dyn Write) -> Result<()>;
}

impl Output for [GeoFeature] {
    fn write_json_lines(&self, writer: &mut dyn Write) -> Result<()> {
        for feature in self.iter() {
            let json = to_string(feature)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    fn write_geojson(&self, writer: &mut dyn Write) -> Result<()> {
        let feature_collection = FeatureCollection { features: self };
        let string = to_string(&feature_collection)?;
        writeln!(writer, "{}", string)?;
        Ok(())
    }
}
